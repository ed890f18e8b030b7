//! Turns a star record and its planet list into the descriptor set the
//! composer consumes.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::descriptor::{CelestialBodyDescriptor, SurfaceClass, MAX_COLOR_HEX};
use crate::rng::SurfaceRng;

pub const STAR_RADIUS: f32 = 8.0;
pub const STAR_COLOR: u32 = 0xFFAA00;
/// Orbit radius of the innermost planet.
pub const FIRST_ORBIT: f32 = 25.0;
/// Gap between consecutive orbits.
pub const ORBIT_SPACING: f32 = 15.0;
/// Angular speed of the innermost planet, radians per reference frame.
pub const BASE_SPEED: f32 = 0.005;

/// A planet as listed under a star by the data layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanetRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Free-form label such as "Gas Giant" or "Super Earth".
    #[serde(default)]
    pub planet_type: Option<String>,
}

impl PlanetRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, label: impl Into<String>) -> Self {
        self.planet_type = Some(label.into());
        self
    }
}

/// A star with its planets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub planets: Vec<PlanetRecord>,
}

/// Laid-out star system.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSystemLayout {
    pub star: CelestialBodyDescriptor,
    pub planets: Vec<CelestialBodyDescriptor>,
}

impl StarSystemLayout {
    /// Place planets on evenly spaced orbits, slower further out.
    ///
    /// Radius, color and starting angle are drawn from `rng` in that order
    /// for each planet. Planets without a type label alternate rocky and
    /// banded, starting rocky.
    pub fn from_planets(star_name: &str, planets: &[PlanetRecord], rng: &mut dyn SurfaceRng) -> Self {
        let star = CelestialBodyDescriptor::star(star_name, STAR_RADIUS)
            .with_color(STAR_COLOR)
            .with_seed(star_name);

        let planets = planets
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let index = i as f32;
                let class = match &record.planet_type {
                    Some(label) => SurfaceClass::from_planet_type(label),
                    None if i % 2 == 0 => SurfaceClass::Rocky,
                    None => SurfaceClass::GasGiant,
                };

                let radius = rng.next_f32() * 2.0 + 1.0;
                let color = ((rng.next_f64() * MAX_COLOR_HEX as f64) as u32).min(MAX_COLOR_HEX);
                let angle = rng.next_f32() * TAU;

                let mut planet = CelestialBodyDescriptor::planet(
                    record.name.clone(),
                    radius,
                    class,
                    FIRST_ORBIT + index * ORBIT_SPACING,
                    BASE_SPEED / (index * 0.5 + 1.0),
                )
                .with_color(color)
                .with_initial_angle(angle)
                .with_seed(record.name.as_str());
                if let Some(id) = &record.id {
                    planet = planet.with_id(id.clone());
                }
                planet
            })
            .collect();

        Self { star, planets }
    }

    pub fn from_record(record: &StarRecord, rng: &mut dyn SurfaceRng) -> Self {
        let mut layout = Self::from_planets(&record.name, &record.planets, rng);
        if let Some(id) = &record.id {
            layout.star = layout.star.with_id(id.clone());
        }
        layout
    }

    /// Star first, then planets in orbit order.
    pub fn into_descriptors(self) -> Vec<CelestialBodyDescriptor> {
        let mut bodies = Vec::with_capacity(self.planets.len() + 1);
        bodies.push(self.star);
        bodies.extend(self.planets);
        bodies
    }
}
