use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn next(self) -> Season {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    /// Target temperature offset and rainfall modifier for the season.
    pub fn climate_mods(self) -> (f32, f32) {
        match self {
            Season::Spring => (0.0, 0.2),
            Season::Summer => (0.15, -0.1),
            Season::Autumn => (-0.05, 0.05),
            Season::Winter => (-0.15, -0.05),
        }
    }
}

/// In-game time. `tick` counts within the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub tick: u32,
    pub day: u32,
    pub season: Season,
    pub year: u32,
}

/// Boundaries crossed by a single calendar step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarStep {
    pub new_day: bool,
    pub new_season: bool,
    pub new_year: bool,
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar {
            tick: 0,
            day: 0,
            season: Season::Spring,
            year: 1,
        }
    }
}

impl Calendar {
    pub fn advance(&mut self, ticks_per_day: u32, days_per_season: u32) -> CalendarStep {
        let mut step = CalendarStep::default();
        self.tick += 1;
        if self.tick >= ticks_per_day.max(1) {
            self.tick = 0;
            self.day += 1;
            step.new_day = true;
            if self.day >= days_per_season.max(1) {
                self.day = 0;
                self.season = self.season.next();
                step.new_season = true;
                if self.season == Season::Spring {
                    self.year += 1;
                    step.new_year = true;
                }
            }
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_rolls_over_after_ticks_per_day() {
        let mut cal = Calendar::default();
        for _ in 0..99 {
            assert!(!cal.advance(100, 30).new_day);
        }
        let step = cal.advance(100, 30);
        assert!(step.new_day);
        assert!(!step.new_season);
        assert_eq!(cal.tick, 0);
        assert_eq!(cal.day, 1);
    }

    #[test]
    fn full_year_cycles_seasons() {
        let mut cal = Calendar::default();
        let mut seasons = vec![cal.season];
        for _ in 0..(4 * 3 * 10) {
            if cal.advance(10, 3).new_season {
                seasons.push(cal.season);
            }
        }
        assert_eq!(
            seasons,
            vec![
                Season::Spring,
                Season::Summer,
                Season::Autumn,
                Season::Winter,
                Season::Spring
            ]
        );
        assert_eq!(cal.year, 2);
    }

    #[test]
    fn zero_lengths_do_not_stall() {
        let mut cal = Calendar::default();
        assert!(cal.advance(0, 0).new_season);
    }
}
