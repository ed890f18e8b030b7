//! Plain data records describing celestial bodies.
//!
//! Descriptors arrive fully resolved from the data layer (or a JSON file) and
//! are never mutated once handed to a [`Scene`](crate::scene::Scene).

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use bevy::color::{ColorToPacked, Srgba};
use bevy::log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigurationError, CosmosResult};
use crate::rng::Seed;

/// Largest value a 24-bit RGB color can take.
pub const MAX_COLOR_HEX: u32 = 0x00FF_FFFF;

/// Radius of the body shown alone in the planet detail view.
pub const DETAIL_RADIUS: f32 = 6.0;

/// Star or planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    Star,
    Planet,
}

/// Appearance profile that selects the surface painter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceClass {
    Star,
    Rocky,
    #[serde(alias = "gas")]
    GasGiant,
}

impl SurfaceClass {
    /// Classify a free-form planet type label such as "Gas Giant" or
    /// "Terrestrial". Gas, jovian, ice and neptunian worlds get bands.
    pub fn from_planet_type(label: &str) -> Self {
        let label = label.to_lowercase();
        let banded = ["gas", "jovian", "ice", "neptunian"]
            .iter()
            .any(|needle| label.contains(needle));
        if banded {
            SurfaceClass::GasGiant
        } else {
            SurfaceClass::Rocky
        }
    }

    /// Fallback base color when a descriptor has none (or a malformed one).
    pub fn default_color(self) -> u32 {
        match self {
            SurfaceClass::Star => 0xFFAA00,
            SurfaceClass::Rocky => 0x8B4513,
            SurfaceClass::GasGiant => 0xCC9966,
        }
    }

    /// Bump strength used when deriving the normal map.
    pub fn normal_strength(self) -> f32 {
        match self {
            SurfaceClass::Star => 1.0,
            SurfaceClass::Rocky => 2.5,
            SurfaceClass::GasGiant => 2.0,
        }
    }
}

/// Opaque identifier handed back to the host in navigation intents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub String);

impl BodyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BodyId {
    fn from(value: &str) -> Self {
        BodyId(value.to_string())
    }
}

/// One celestial body as delivered by the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialBodyDescriptor {
    /// Routing identifier. Falls back to `name` when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub kind: BodyKind,
    pub radius: f32,
    /// 24-bit RGB. `None` (or an unparseable value) uses the class default.
    #[serde(default, deserialize_with = "deserialize_color")]
    pub base_color: Option<u32>,
    pub surface_class: SurfaceClass,
    /// Zero marks the orbit anchor.
    #[serde(default)]
    pub orbit_distance: f32,
    /// Radians advanced per reference frame.
    #[serde(default)]
    pub angular_speed: f32,
    #[serde(default)]
    pub initial_angle: f32,
    #[serde(default)]
    pub seed: Option<Seed>,
}

impl CelestialBodyDescriptor {
    /// A central star at the origin.
    pub fn star(name: impl Into<String>, radius: f32) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind: BodyKind::Star,
            radius,
            base_color: None,
            surface_class: SurfaceClass::Star,
            orbit_distance: 0.0,
            angular_speed: 0.0,
            initial_angle: 0.0,
            seed: None,
        }
    }

    /// A planet on a circular orbit.
    pub fn planet(
        name: impl Into<String>,
        radius: f32,
        surface_class: SurfaceClass,
        orbit_distance: f32,
        angular_speed: f32,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind: BodyKind::Planet,
            radius,
            base_color: None,
            surface_class,
            orbit_distance,
            angular_speed,
            initial_angle: 0.0,
            seed: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_color(mut self, hex: u32) -> Self {
        self.base_color = Some(hex);
        self
    }

    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn with_initial_angle(mut self, radians: f32) -> Self {
        self.initial_angle = radians;
        self
    }

    /// The same body re-centred as the lone anchor of a detail view.
    ///
    /// Identity, class, color and seed are kept so the painted surface
    /// matches the one shown in the system view at a higher resolution.
    pub fn as_detail_anchor(&self) -> Self {
        Self {
            radius: DETAIL_RADIUS,
            orbit_distance: 0.0,
            angular_speed: 0.0,
            initial_angle: 0.0,
            id: Some(self.body_id().0),
            ..self.clone()
        }
    }

    /// Identifier used for picking and navigation.
    pub fn body_id(&self) -> BodyId {
        BodyId(self.id.clone().unwrap_or_else(|| self.name.clone()))
    }

    /// True for the body every other body orbits.
    pub fn is_anchor(&self) -> bool {
        self.orbit_distance == 0.0
    }

    /// Base color with out-of-range or missing values replaced by the class
    /// default.
    pub fn resolved_base_color(&self) -> u32 {
        match self.base_color {
            Some(hex) if hex <= MAX_COLOR_HEX => hex,
            Some(hex) => {
                warn!(
                    "Body '{}' color {:#x} exceeds 24 bits, using {:?} default",
                    self.name, hex, self.surface_class
                );
                self.surface_class.default_color()
            }
            None => self.surface_class.default_color(),
        }
    }

    fn check_finite(&self) -> Result<(), ConfigurationError> {
        let fields = [
            ("radius", self.radius),
            ("orbit distance", self.orbit_distance),
            ("angular speed", self.angular_speed),
            ("initial angle", self.initial_angle),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite {
                    name: self.name.clone(),
                    field,
                });
            }
        }
        Ok(())
    }
}

/// Check the scene invariants and return the index of the anchor body.
pub fn validate_system(bodies: &[CelestialBodyDescriptor]) -> Result<usize, ConfigurationError> {
    if bodies.is_empty() {
        return Err(ConfigurationError::EmptySystem);
    }

    let mut ids = HashSet::new();
    for body in bodies {
        body.check_finite()?;
        if body.radius <= 0.0 {
            return Err(ConfigurationError::NonPositiveRadius {
                name: body.name.clone(),
                radius: body.radius,
            });
        }
        if body.orbit_distance < 0.0 {
            return Err(ConfigurationError::NegativeOrbitDistance {
                name: body.name.clone(),
                distance: body.orbit_distance,
            });
        }
        let id = body.body_id();
        if !ids.insert(id.clone()) {
            return Err(ConfigurationError::DuplicateId(id.0));
        }
    }

    let anchors: Vec<usize> = bodies
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_anchor())
        .map(|(i, _)| i)
        .collect();

    match anchors.as_slice() {
        [] => Err(ConfigurationError::MissingAnchor),
        [index] => Ok(*index),
        _ => Err(ConfigurationError::MultipleAnchors(
            anchors.iter().map(|&i| bodies[i].name.clone()).collect(),
        )),
    }
}

/// On-disk layout of a system description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemFile {
    pub bodies: Vec<CelestialBodyDescriptor>,
}

/// Parse a system description from JSON text.
pub fn parse_system_json(text: &str) -> CosmosResult<Vec<CelestialBodyDescriptor>> {
    let file: SystemFile = serde_json::from_str(text)?;
    Ok(file.bodies)
}

/// Load a system description from a JSON file.
pub fn load_system_json<P: AsRef<Path>>(path: P) -> CosmosResult<Vec<CelestialBodyDescriptor>> {
    let text = std::fs::read_to_string(path)?;
    parse_system_json(&text)
}

/// Parse "#rrggbb", "#rgb", "rrggbb" or "0xrrggbb" into a 24-bit value.
pub fn parse_color_hex(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Some(digits) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        return u32::from_str_radix(digits, 16)
            .ok()
            .filter(|&hex| hex <= MAX_COLOR_HEX);
    }
    let [r, g, b, _] = Srgba::hex(text).ok()?.to_u8_array();
    Some(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let color = match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) => {
            let color = n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|v| u32::try_from(v).ok());
            if color.is_none() {
                warn!("Ignoring color {}: not a non-negative 32-bit value", n);
            }
            color
        }
        Some(serde_json::Value::String(s)) => {
            let color = parse_color_hex(&s);
            if color.is_none() {
                warn!("Ignoring unparseable color '{}'", s);
            }
            color
        }
        Some(other) => {
            warn!("Ignoring color {}: expected a string or number", other);
            None
        }
    };
    Ok(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_system() -> Vec<CelestialBodyDescriptor> {
        vec![
            CelestialBodyDescriptor::star("Sol", 8.0),
            CelestialBodyDescriptor::planet("Jove", 2.0, SurfaceClass::GasGiant, 25.0, 0.0008),
            CelestialBodyDescriptor::planet("Terra", 1.5, SurfaceClass::Rocky, 40.0, 0.00053),
        ]
    }

    #[test]
    fn test_detail_anchor_keeps_identity() {
        let jove = CelestialBodyDescriptor::planet("Jove", 2.0, SurfaceClass::GasGiant, 25.0, 0.0008)
            .with_color(0x336699)
            .with_seed(9u32)
            .with_initial_angle(1.0);
        let detail = jove.as_detail_anchor();
        assert!(detail.is_anchor());
        assert_eq!(detail.radius, DETAIL_RADIUS);
        assert_eq!(detail.angular_speed, 0.0);
        assert_eq!(detail.initial_angle, 0.0);
        assert_eq!(detail.body_id(), jove.body_id());
        assert_eq!(detail.base_color, Some(0x336699));
        assert_eq!(detail.seed, jove.seed);
        assert_eq!(validate_system(&[detail]), Ok(0));
    }

    #[test]
    fn test_valid_system_returns_anchor_index() {
        assert_eq!(validate_system(&sample_system()), Ok(0));
    }

    #[test]
    fn test_missing_anchor_rejected() {
        let bodies = sample_system().into_iter().skip(1).collect::<Vec<_>>();
        assert_eq!(validate_system(&bodies), Err(ConfigurationError::MissingAnchor));
    }

    #[test]
    fn test_two_anchors_rejected() {
        let mut bodies = sample_system();
        bodies.push(CelestialBodyDescriptor::star("Companion", 4.0));
        match validate_system(&bodies) {
            Err(ConfigurationError::MultipleAnchors(names)) => {
                assert_eq!(names, vec!["Sol".to_string(), "Companion".to_string()]);
            }
            other => panic!("expected MultipleAnchors, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_radius_rejected() {
        let mut bodies = sample_system();
        bodies[2].radius = 0.0;
        assert!(matches!(
            validate_system(&bodies),
            Err(ConfigurationError::NonPositiveRadius { .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut bodies = sample_system();
        bodies[1].angular_speed = f32::NAN;
        assert!(matches!(
            validate_system(&bodies),
            Err(ConfigurationError::NonFinite { field: "angular speed", .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut bodies = sample_system();
        bodies[2] = bodies[2].clone().with_id("Jove");
        assert_eq!(
            validate_system(&bodies),
            Err(ConfigurationError::DuplicateId("Jove".to_string()))
        );
    }

    #[test]
    fn test_empty_system_rejected() {
        assert_eq!(validate_system(&[]), Err(ConfigurationError::EmptySystem));
    }

    #[test]
    fn test_planet_type_classification() {
        assert_eq!(SurfaceClass::from_planet_type("Gas Giant"), SurfaceClass::GasGiant);
        assert_eq!(SurfaceClass::from_planet_type("Hot Jovian"), SurfaceClass::GasGiant);
        assert_eq!(SurfaceClass::from_planet_type("Ice giant"), SurfaceClass::GasGiant);
        assert_eq!(SurfaceClass::from_planet_type("Neptunian"), SurfaceClass::GasGiant);
        assert_eq!(SurfaceClass::from_planet_type("Terrestrial"), SurfaceClass::Rocky);
        assert_eq!(SurfaceClass::from_planet_type(""), SurfaceClass::Rocky);
    }

    #[test]
    fn test_color_fallbacks() {
        let planet = CelestialBodyDescriptor::planet("X", 1.0, SurfaceClass::Rocky, 10.0, 0.0);
        assert_eq!(planet.resolved_base_color(), 0x8B4513);
        assert_eq!(planet.clone().with_color(0x123456).resolved_base_color(), 0x123456);
        assert_eq!(planet.with_color(0x1_000_000).resolved_base_color(), 0x8B4513);
    }

    #[test]
    fn test_parse_color_hex() {
        assert_eq!(parse_color_hex("#cc9966"), Some(0xCC9966));
        assert_eq!(parse_color_hex("0x8B4513"), Some(0x8B4513));
        assert_eq!(parse_color_hex("ffaa00"), Some(0xFFAA00));
        assert_eq!(parse_color_hex("#fff"), Some(0xFFFFFF));
        assert_eq!(parse_color_hex("not a color"), None);
        assert_eq!(parse_color_hex("0x1FFFFFF"), None);
    }

    #[test]
    fn test_parse_system_json() {
        let text = r##"{
            "bodies": [
                { "name": "Sol", "kind": "star", "radius": 8, "surface_class": "star" },
                { "id": "p-1", "name": "Jove", "kind": "planet", "radius": 2.5,
                  "surface_class": "gas_giant", "orbit_distance": 25,
                  "angular_speed": 0.0008, "base_color": "#cc9966", "seed": "Jove" },
                { "name": "Rust", "kind": "planet", "radius": 1.2,
                  "surface_class": "rocky", "orbit_distance": 40,
                  "base_color": "garbage", "seed": 99 }
            ]
        }"##;
        let bodies = parse_system_json(text).unwrap();
        assert_eq!(bodies.len(), 3);
        assert!(bodies[0].is_anchor());
        assert_eq!(bodies[1].body_id(), BodyId::from("p-1"));
        assert_eq!(bodies[1].base_color, Some(0xCC9966));
        assert_eq!(bodies[1].seed, Some(Seed::Text("Jove".into())));
        assert_eq!(bodies[2].base_color, None);
        assert_eq!(bodies[2].resolved_base_color(), 0x8B4513);
        assert_eq!(bodies[2].seed, Some(Seed::Number(99.0)));
    }

    #[test]
    fn test_malformed_colors_fall_back_without_failing_the_load() {
        for color in ["-5", "1.5e12", "true", "[1, 2, 3]", "{\"r\": 1}", "\"#12\""] {
            let text = format!(
                r#"{{ "bodies": [{{ "name": "Sol", "kind": "star", "radius": 8,
                    "surface_class": "star", "base_color": {} }}] }}"#,
                color
            );
            let bodies = parse_system_json(&text).unwrap();
            assert_eq!(bodies[0].base_color, None, "{}", color);
            assert_eq!(bodies[0].resolved_base_color(), 0xFFAA00, "{}", color);
        }
        let bodies = parse_system_json(
            r#"{ "bodies": [{ "name": "Sol", "kind": "star", "radius": 8,
                "surface_class": "star", "base_color": 16711680 }] }"#,
        )
        .unwrap();
        assert_eq!(bodies[0].base_color, Some(0xFF0000));
    }

    #[test]
    fn test_load_system_json_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.json");
        let file = SystemFile {
            bodies: sample_system(),
        };
        std::fs::write(&path, serde_json::to_string_pretty(&file).unwrap()).unwrap();

        let loaded = load_system_json(&path).unwrap();
        assert_eq!(loaded, sample_system());
    }
}
