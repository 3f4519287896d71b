//! Scenario economy engine
//!
//! Pure pricing and demand math for the business simulations, plus the
//! random draws (demand noise, daily expenses, flavor events). Every
//! random function takes the RNG as an argument so the daemon can inject
//! a seeded generator and the simulator stays reproducible.
//!
//! ## Demand model
//!
//! Demand reacts to the asking price relative to the product's suggested
//! price:
//!
//! | Price ratio        | Multiplier |
//! |--------------------|------------|
//! | > 1.2 (overpriced) | 0.5        |
//! | < 0.8 (bargain)    | 1.5        |
//! | otherwise          | 1.0        |
//!
//! Units sold = floor(requested * multiplier * u) with u uniform in
//! [0.6, 1.0), then capped at on-hand stock by the caller. Zero units is
//! a valid outcome (nobody bought).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::ScenarioEvent;

/// Economy tunables; defaults are the balance the game shipped with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyParams {
    /// Chance of a flavor event on day advance (0.0 - 1.0)
    #[serde(default = "default_event_chance")]
    pub event_chance: f64,
    /// Daily operating expense range, inclusive, in cents
    #[serde(default = "default_expense_min")]
    pub daily_expense_min_cents: i64,
    #[serde(default = "default_expense_max")]
    pub daily_expense_max_cents: i64,
    /// Price ratio above which demand halves
    #[serde(default = "default_high_ratio")]
    pub high_price_ratio: f64,
    /// Price ratio below which demand grows by half
    #[serde(default = "default_low_ratio")]
    pub low_price_ratio: f64,
    #[serde(default = "default_high_multiplier")]
    pub high_price_multiplier: f64,
    #[serde(default = "default_low_multiplier")]
    pub low_price_multiplier: f64,
    /// Demand noise draw bounds; u is uniform in [min, max)
    #[serde(default = "default_draw_min")]
    pub demand_draw_min: f64,
    #[serde(default = "default_draw_max")]
    pub demand_draw_max: f64,
    /// Fixed RNG seed; None draws from entropy
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_event_chance() -> f64 {
    0.30
}

fn default_expense_min() -> i64 {
    1000
}

fn default_expense_max() -> i64 {
    5000
}

fn default_high_ratio() -> f64 {
    1.2
}

fn default_low_ratio() -> f64 {
    0.8
}

fn default_high_multiplier() -> f64 {
    0.5
}

fn default_low_multiplier() -> f64 {
    1.5
}

fn default_draw_min() -> f64 {
    0.6
}

fn default_draw_max() -> f64 {
    1.0
}

impl Default for EconomyParams {
    fn default() -> Self {
        Self {
            event_chance: default_event_chance(),
            daily_expense_min_cents: default_expense_min(),
            daily_expense_max_cents: default_expense_max(),
            high_price_ratio: default_high_ratio(),
            low_price_ratio: default_low_ratio(),
            high_price_multiplier: default_high_multiplier(),
            low_price_multiplier: default_low_multiplier(),
            demand_draw_min: default_draw_min(),
            demand_draw_max: default_draw_max(),
            rng_seed: None,
        }
    }
}

impl EconomyParams {
    /// Demand multiplier for an asking price against the suggested price.
    /// A non-positive suggested price disables the reaction.
    pub fn demand_multiplier(&self, price_cents: i64, suggested_cents: i64) -> f64 {
        if suggested_cents <= 0 {
            return 1.0;
        }
        let ratio = price_cents as f64 / suggested_cents as f64;
        if ratio > self.high_price_ratio {
            self.high_price_multiplier
        } else if ratio < self.low_price_ratio {
            self.low_price_multiplier
        } else {
            1.0
        }
    }

    /// Draw the demand noise factor u from [min, max)
    pub fn draw_demand(&self, rng: &mut impl Rng) -> f64 {
        rng.gen_range(self.demand_draw_min..self.demand_draw_max)
    }

    /// Draw today's operating expense in cents
    pub fn draw_expense(&self, rng: &mut impl Rng) -> i64 {
        rng.gen_range(self.daily_expense_min_cents..=self.daily_expense_max_cents)
    }

    /// Maybe pick a flavor event, weighted by each event's weight.
    /// Returns None when the dice say quiet day or the list is empty.
    pub fn maybe_event<'a>(
        &self,
        rng: &mut impl Rng,
        events: &'a [ScenarioEvent],
    ) -> Option<&'a ScenarioEvent> {
        if events.is_empty() || !rng.gen_bool(self.event_chance.clamp(0.0, 1.0)) {
            return None;
        }
        pick_weighted(rng, events)
    }
}

/// Units actually sold before the stock cap: floor(requested * mult * u)
pub fn units_sold(requested: i64, multiplier: f64, draw: f64) -> i64 {
    if requested <= 0 {
        return 0;
    }
    (requested as f64 * multiplier * draw).floor() as i64
}

fn pick_weighted<'a>(rng: &mut impl Rng, events: &'a [ScenarioEvent]) -> Option<&'a ScenarioEvent> {
    let total: i64 = events.iter().map(|e| e.weight.max(0)).sum();
    if total <= 0 {
        return None;
    }
    let mut roll = rng.gen_range(0..total);
    for event in events {
        let w = event.weight.max(0);
        if roll < w {
            return Some(event);
        }
        roll -= w;
    }
    None
}
