use std::collections::BTreeMap;

use serde::Serialize;

use crate::world::species::{SpeciesId, SpeciesTable};
use crate::world::Island;

/// Sampling stride in both axes.
pub const SAMPLE_STRIDE: usize = 4;

/// Island-wide aggregates.
///
/// Field averages and tile counts come from a sample of every
/// `SAMPLE_STRIDE`-th cell in each axis, so they approximate rather than
/// exactly measure the grid. Counts are scaled back up by the stride squared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IslandStats {
    pub tick: u64,
    pub population: BTreeMap<SpeciesId, u32>,
    pub total_animals: u32,
    pub avg_soil: f32,
    pub avg_vegetation: f32,
    pub avg_water: f32,
    pub land_tiles: u32,
    pub protected_tiles: u32,
    pub developed_tiles: u32,
    pub ocean_ratio: f32,
    /// Share of sampled land with almost no vegetation.
    pub barren_ratio: f32,
}

impl Default for IslandStats {
    fn default() -> Self {
        IslandStats {
            tick: 0,
            population: BTreeMap::new(),
            total_animals: 0,
            avg_soil: 0.0,
            avg_vegetation: 0.0,
            avg_water: 0.0,
            land_tiles: 0,
            protected_tiles: 0,
            developed_tiles: 0,
            ocean_ratio: 1.0,
            barren_ratio: 0.0,
        }
    }
}

impl IslandStats {
    pub fn developed_ratio(&self) -> f32 {
        if self.land_tiles == 0 {
            0.0
        } else {
            self.developed_tiles as f32 / self.land_tiles as f32
        }
    }

    pub fn protected_ratio(&self) -> f32 {
        if self.land_tiles == 0 {
            0.0
        } else {
            self.protected_tiles as f32 / self.land_tiles as f32
        }
    }
}

const BARREN_VEGETATION: f32 = 0.02;

pub fn compute_stats(island: &Island) -> IslandStats {
    let grid = &island.grid;
    let mut population: BTreeMap<SpeciesId, u32> = BTreeMap::new();
    for (_, animal) in island.animals.iter() {
        *population.entry(animal.species).or_insert(0) += 1;
    }
    let total_animals = population.values().sum();

    let mut sampled = 0u32;
    let mut land = 0u32;
    let mut protected = 0u32;
    let mut developed = 0u32;
    let mut barren = 0u32;
    let (mut soil, mut vegetation, mut water) = (0.0_f64, 0.0_f64, 0.0_f64);

    for y in (0..grid.height()).step_by(SAMPLE_STRIDE) {
        for x in (0..grid.width()).step_by(SAMPLE_STRIDE) {
            let (x, y) = (x as i32, y as i32);
            sampled += 1;
            if !grid.is_land(x, y) {
                continue;
            }
            land += 1;
            let v = grid.vegetation(x, y);
            soil += grid.soil(x, y) as f64;
            vegetation += v as f64;
            water += grid.water(x, y) as f64;
            if grid.is_protected(x, y) {
                protected += 1;
            }
            if grid.is_developed(x, y) {
                developed += 1;
            }
            if v < BARREN_VEGETATION {
                barren += 1;
            }
        }
    }

    let mean = |sum: f64| if land == 0 { 0.0 } else { (sum / land as f64) as f32 };
    let scale = (SAMPLE_STRIDE * SAMPLE_STRIDE) as u32;
    IslandStats {
        tick: island.tick_count,
        population,
        total_animals,
        avg_soil: mean(soil),
        avg_vegetation: mean(vegetation),
        avg_water: mean(water),
        land_tiles: land * scale,
        protected_tiles: protected * scale,
        developed_tiles: developed * scale,
        ocean_ratio: if sampled == 0 {
            1.0
        } else {
            (sampled - land) as f32 / sampled as f32
        },
        barren_ratio: if land == 0 { 0.0 } else { barren as f32 / land as f32 },
    }
}

/// Letter grade for an eco score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EcoRating {
    S,
    A,
    B,
    C,
    D,
    E,
    F,
}

impl EcoRating {
    pub fn from_score(score: u8) -> EcoRating {
        match score {
            90.. => EcoRating::S,
            75.. => EcoRating::A,
            60.. => EcoRating::B,
            45.. => EcoRating::C,
            30.. => EcoRating::D,
            15.. => EcoRating::E,
            _ => EcoRating::F,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EcoRating::S => "Pristine",
            EcoRating::A => "Thriving",
            EcoRating::B => "Healthy",
            EcoRating::C => "Stable",
            EcoRating::D => "Stressed",
            EcoRating::E => "Degraded",
            EcoRating::F => "Collapsing",
        }
    }
}

const HEALTHY_POPULATION_MIN: f32 = 20.0;
const HEALTHY_POPULATION_MAX: f32 = 150.0;

/// Overall ecosystem health, 0-100.
///
/// Weights: biodiversity 15 plus balance 10, vegetation 20, soil 15,
/// water 10, conservation 15, population health 15.
pub fn eco_score(stats: &IslandStats, species: &SpeciesTable) -> u8 {
    let mut score = 0.0_f32;

    let counts: Vec<u32> = species
        .iter()
        .map(|s| stats.population.get(&s.id).copied().unwrap_or(0))
        .collect();
    let present: Vec<u32> = counts.iter().copied().filter(|&c| c > 0).collect();
    if !counts.is_empty() {
        score += present.len() as f32 / counts.len() as f32 * 15.0;
    }
    if present.len() >= 2 {
        let min = present.iter().copied().min().unwrap_or(0) as f32;
        let max = present.iter().copied().max().unwrap_or(1).max(1) as f32;
        score += min / max * 10.0;
    }

    score += (stats.avg_vegetation / 0.4).clamp(0.0, 1.0) * 20.0;
    score += (stats.avg_soil / 0.5).clamp(0.0, 1.0) * 15.0;
    score += (stats.avg_water / 0.2).clamp(0.0, 1.0) * 10.0;

    score += (stats.protected_ratio() * 3.0).clamp(0.0, 1.0) * 10.0;
    score += ((0.3 - stats.developed_ratio()) / 0.3).clamp(0.0, 1.0) * 5.0;

    let n = stats.total_animals as f32;
    let health = if n < HEALTHY_POPULATION_MIN {
        n / HEALTHY_POPULATION_MIN
    } else if n > HEALTHY_POPULATION_MAX {
        (1.0 - (n - HEALTHY_POPULATION_MAX) / 100.0).max(0.0)
    } else {
        1.0
    };
    score += health * 15.0;

    score.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskKind {
    SoilDepletion,
    VegetationLoss,
    WaterShortage,
    Overdevelopment,
    SpeciesEndangered,
    Desertification,
    OceanCritical,
    OceanCatastrophe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskWarning {
    pub kind: RiskKind,
    /// 1 (watch) to 4 (catastrophe).
    pub severity: u8,
    pub message: String,
}

/// Collapse warnings for the current stats, most severe first.
pub fn assess_risks(stats: &IslandStats) -> Vec<RiskWarning> {
    let mut warnings = Vec::new();
    let mut warn = |kind, severity, message: String| {
        warnings.push(RiskWarning {
            kind,
            severity,
            message,
        })
    };

    if stats.avg_soil > 0.0 && stats.avg_soil < 0.12 {
        warn(
            RiskKind::SoilDepletion,
            2,
            format!("soil depleted (avg {:.3})", stats.avg_soil),
        );
    }
    if stats.avg_vegetation > 0.0 && stats.avg_vegetation < 0.08 {
        warn(
            RiskKind::VegetationLoss,
            2,
            format!("vegetation collapsing (avg {:.3})", stats.avg_vegetation),
        );
    }
    if stats.land_tiles > 0 && stats.avg_water < 0.04 {
        warn(
            RiskKind::WaterShortage,
            2,
            format!("water shortage (avg {:.3})", stats.avg_water),
        );
    }
    if stats.developed_ratio() > 0.35 {
        warn(
            RiskKind::Overdevelopment,
            1,
            format!("{:.0}% of land developed", stats.developed_ratio() * 100.0),
        );
    }
    for (species, &count) in &stats.population {
        if (1..=3).contains(&count) {
            warn(
                RiskKind::SpeciesEndangered,
                2,
                format!("species {} down to {} animals", species, count),
            );
        }
    }
    if stats.barren_ratio > 0.6 {
        warn(
            RiskKind::Desertification,
            3,
            format!("{:.0}% of land barren", stats.barren_ratio * 100.0),
        );
    }
    if stats.ocean_ratio < 0.05 {
        warn(
            RiskKind::OceanCatastrophe,
            4,
            format!("ocean nearly gone ({:.1}%)", stats.ocean_ratio * 100.0),
        );
    } else if stats.ocean_ratio < 0.12 {
        warn(
            RiskKind::OceanCritical,
            3,
            format!("ocean critically low ({:.1}%)", stats.ocean_ratio * 100.0),
        );
    }

    warnings.sort_by(|a, b| b.severity.cmp(&a.severity));
    warnings
}
