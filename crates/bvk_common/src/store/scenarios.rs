//! Scenario storage: templates, play-throughs, inventory and the ledger.
//!
//! Every mutating operation runs in one transaction after re-checking
//! that the play-through belongs to the caller and is still live, so a
//! buy can never land on a finished game and money totals stay in step
//! with the ledger.

use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::accounts::{apply_milestones, apply_points};
use super::{parse_ts, parse_ts_opt, ts, Store};
use crate::achievements::MilestoneEvent;
use crate::economy::{self, EconomyParams};
use crate::error::{BvkError, Result};
use crate::models::{
    Achievement, InventoryItem, LedgerEntry, LedgerKind, PlayStatus, PlayThrough, Product, Profile,
    Scenario, ScenarioDifficulty, ScenarioEvent,
};

/// Full state of one play-through, as the client renders it.
/// Ledger entries come newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PlayView {
    pub play: PlayThrough,
    pub scenario: Scenario,
    pub products: Vec<Product>,
    pub inventory: Vec<InventoryItem>,
    pub ledger: Vec<LedgerEntry>,
}

/// Outcome of starting a scenario: a fresh run or the live one resumed
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub view: PlayView,
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyOutcome {
    pub play: PlayThrough,
    pub product: Product,
    pub on_hand: i64,
    pub entry: LedgerEntry,
}

/// A sale either moves stock or fizzles. A fizzle is not an error: the
/// state is untouched and the player can reprice and try again.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SellOutcome {
    Sold {
        play: PlayThrough,
        product: Product,
        units_sold: i64,
        revenue_cents: i64,
        on_hand: i64,
        entry: LedgerEntry,
    },
    NoSale {
        play: PlayThrough,
        demand_multiplier: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct DayOutcome {
    pub play: PlayThrough,
    pub expense_cents: i64,
    pub event: Option<ScenarioEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndOutcome {
    pub play: PlayThrough,
    pub target_met: bool,
    pub final_profit_cents: i64,
    pub points_awarded: i64,
    pub coins_awarded: i64,
    pub profile: Option<Profile>,
    pub newly_awarded: Vec<Achievement>,
}

/// A play-through joined with its scenario, for history and feeds
#[derive(Debug, Clone, Serialize)]
pub struct PlayActivity {
    pub play: PlayThrough,
    pub scenario: Scenario,
}

impl Store {
    // ---- content management (ids on inputs are ignored) ----

    pub fn create_scenario(&self, scenario: &Scenario) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO scenarios
                (slug, title, description, icon, difficulty, initial_budget_cents,
                 target_profit_cents, duration_label, age_range, points_reward, coins_reward,
                 sort_order, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                scenario.slug,
                scenario.title,
                scenario.description,
                scenario.icon,
                scenario.difficulty.as_str(),
                scenario.initial_budget_cents,
                scenario.target_profit_cents,
                scenario.duration_label,
                scenario.age_range,
                scenario.points_reward,
                scenario.coins_reward,
                scenario.sort_order,
                scenario.is_active as i64
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn create_product(&self, product: &Product) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO products (scenario_id, name, icon, unit_cost_cents, suggested_price_cents) VALUES (?, ?, ?, ?, ?)",
            params![
                product.scenario_id,
                product.name,
                product.icon,
                product.unit_cost_cents,
                product.suggested_price_cents
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn create_scenario_event(&self, event: &ScenarioEvent) -> Result<i64> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO scenario_events (scenario_id, description, icon, weight) VALUES (?, ?, ?, ?)",
            params![event.scenario_id, event.description, event.icon, event.weight],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // ---- reads ----

    pub fn list_scenarios(&self) -> Result<Vec<Scenario>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM scenarios WHERE is_active = 1 ORDER BY sort_order",
            SCENARIO_COLS
        ))?;
        let rows = stmt.query_map([], row_scenario)?;

        let mut scenarios = Vec::new();
        for row in rows {
            scenarios.push(row?);
        }
        Ok(scenarios)
    }

    pub fn get_scenario(&self, scenario_id: i64) -> Result<Option<Scenario>> {
        let conn = self.lock();
        get_scenario_conn(&conn, scenario_id)
    }

    pub fn get_scenario_by_slug(&self, slug: &str) -> Result<Option<Scenario>> {
        let conn = self.lock();
        let scenario = conn
            .query_row(
                &format!("SELECT {} FROM scenarios WHERE slug = ? AND is_active = 1", SCENARIO_COLS),
                params![slug],
                row_scenario,
            )
            .optional()?;
        Ok(scenario)
    }

    pub fn products_of(&self, scenario_id: i64) -> Result<Vec<Product>> {
        let conn = self.lock();
        products_conn(&conn, scenario_id)
    }

    /// Current state of a play-through; callers only see their own
    pub fn playthrough_view(&self, user_id: i64, play_id: i64) -> Result<PlayView> {
        let conn = self.lock();
        let play = get_play_conn(&conn, user_id, play_id)?;
        view_conn(&conn, play)
    }

    /// Play-through history joined with scenarios, newest first
    pub fn plays_of(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<PlayActivity>> {
        let conn = self.lock();
        let mut sql = format!(
            r#"
            SELECT {}, {}
            FROM playthroughs p
            JOIN scenarios s ON s.id = p.scenario_id
            WHERE p.user_id = ?
            ORDER BY p.started_at DESC
            "#,
            prefixed(PLAY_COLS, "p"),
            prefixed(SCENARIO_COLS, "s")
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(PlayActivity {
                play: row_play(row)?,
                scenario: row_scenario_at(row, 11)?,
            })
        })?;

        let mut plays = Vec::new();
        for row in rows {
            plays.push(row?);
        }
        Ok(plays)
    }

    pub fn completed_scenario_count(&self, user_id: i64) -> Result<i64> {
        let conn = self.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM playthroughs WHERE user_id = ? AND status = 'completed'",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// The user's live run of a scenario, if one exists. At most one per
    /// (user, scenario) by the partial unique index.
    pub fn active_play(&self, user_id: i64, scenario_id: i64) -> Result<Option<PlayThrough>> {
        let conn = self.lock();
        live_play_conn(&conn, user_id, scenario_id)
    }

    // ---- game operations ----

    /// Start a scenario, or resume the live run if one exists. A fresh
    /// run gets the scenario's budget and a zeroed inventory row per
    /// product.
    pub fn start_scenario(
        &self,
        user_id: i64,
        scenario_id: i64,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let scenario =
            get_scenario_conn(&tx, scenario_id)?.ok_or(BvkError::NotFound("scenario"))?;

        if let Some(play) = live_play_conn(&tx, user_id, scenario_id)? {
            let view = view_conn(&tx, play)?;
            return Ok(StartOutcome {
                view,
                resumed: true,
            });
        }

        tx.execute(
            "INSERT INTO playthroughs (user_id, scenario_id, budget_cents, started_at) VALUES (?, ?, ?, ?)",
            params![user_id, scenario_id, scenario.initial_budget_cents, ts(now)],
        )?;
        let play_id = tx.last_insert_rowid();
        for product in products_conn(&tx, scenario_id)? {
            tx.execute(
                "INSERT INTO inventory_items (playthrough_id, product_id, on_hand) VALUES (?, ?, 0)",
                params![play_id, product.id],
            )?;
        }

        let play = get_play_conn(&tx, user_id, play_id)?;
        let view = view_conn(&tx, play)?;
        tx.commit()?;
        Ok(StartOutcome {
            view,
            resumed: false,
        })
    }

    /// Buy stock at the product's unit cost. Money moves from budget
    /// into costs and the units land in inventory.
    pub fn buy_product(
        &self,
        user_id: i64,
        play_id: i64,
        product_id: i64,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<BuyOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let play = get_play_conn(&tx, user_id, play_id)?;
        ensure_live(&play)?;
        if quantity <= 0 {
            return Err(BvkError::validation("quantity must be positive"));
        }
        let product = product_in_scenario(&tx, play.scenario_id, product_id)?;

        let total = product.unit_cost_cents * quantity;
        if total > play.budget_cents {
            return Err(BvkError::validation("not enough budget for that purchase"));
        }

        tx.execute(
            "UPDATE playthroughs SET budget_cents = budget_cents - ?, costs_cents = costs_cents + ? WHERE id = ?",
            params![total, total, play_id],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO inventory_items (playthrough_id, product_id, on_hand) VALUES (?, ?, 0)",
            params![play_id, product_id],
        )?;
        tx.execute(
            "UPDATE inventory_items SET on_hand = on_hand + ? WHERE playthrough_id = ? AND product_id = ?",
            params![quantity, play_id, product_id],
        )?;
        let entry = insert_entry(
            &tx,
            play_id,
            LedgerKind::Purchase,
            Some(product_id),
            quantity,
            product.unit_cost_cents,
            total,
            play.days_played,
            now,
        )?;

        let play = get_play_conn(&tx, user_id, play_id)?;
        let on_hand = on_hand_conn(&tx, play_id, product_id)?;
        tx.commit()?;
        Ok(BuyOutcome {
            play,
            product,
            on_hand,
            entry,
        })
    }

    /// Offer units for sale at a price. Demand scales with how the
    /// price compares to the suggested one, a random draw decides the
    /// day's appetite, and sales never exceed stock on hand.
    #[allow(clippy::too_many_arguments)]
    pub fn sell_product(
        &self,
        user_id: i64,
        play_id: i64,
        product_id: i64,
        quantity: i64,
        price_cents: i64,
        economy: &EconomyParams,
        rng: &mut impl Rng,
        now: DateTime<Utc>,
    ) -> Result<SellOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let play = get_play_conn(&tx, user_id, play_id)?;
        ensure_live(&play)?;
        if quantity <= 0 {
            return Err(BvkError::validation("quantity must be positive"));
        }
        if price_cents <= 0 {
            return Err(BvkError::validation("price must be positive"));
        }
        let product = product_in_scenario(&tx, play.scenario_id, product_id)?;

        let on_hand = on_hand_conn(&tx, play_id, product_id)?;
        if on_hand <= 0 {
            return Err(BvkError::validation("nothing in stock to sell"));
        }

        let multiplier = economy.demand_multiplier(price_cents, product.suggested_price_cents);
        let draw = economy.draw_demand(rng);
        let units = economy::units_sold(quantity, multiplier, draw);
        if units == 0 {
            return Ok(SellOutcome::NoSale {
                play,
                demand_multiplier: multiplier,
            });
        }
        let units = units.min(on_hand);

        let revenue = units * price_cents;
        tx.execute(
            "UPDATE playthroughs SET budget_cents = budget_cents + ?, revenue_cents = revenue_cents + ? WHERE id = ?",
            params![revenue, revenue, play_id],
        )?;
        tx.execute(
            "UPDATE inventory_items SET on_hand = on_hand - ? WHERE playthrough_id = ? AND product_id = ?",
            params![units, play_id, product_id],
        )?;
        let entry = insert_entry(
            &tx,
            play_id,
            LedgerKind::Sale,
            Some(product_id),
            units,
            price_cents,
            revenue,
            play.days_played,
            now,
        )?;

        let play = get_play_conn(&tx, user_id, play_id)?;
        let on_hand = on_hand_conn(&tx, play_id, product_id)?;
        tx.commit()?;
        Ok(SellOutcome::Sold {
            play,
            product,
            units_sold: units,
            revenue_cents: revenue,
            on_hand,
            entry,
        })
    }

    /// Close out the day: bump the counter, charge a random operating
    /// expense and maybe surface a flavor event.
    pub fn advance_day(
        &self,
        user_id: i64,
        play_id: i64,
        economy: &EconomyParams,
        rng: &mut impl Rng,
        now: DateTime<Utc>,
    ) -> Result<DayOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let play = get_play_conn(&tx, user_id, play_id)?;
        ensure_live(&play)?;

        let expense = economy.draw_expense(rng);
        let day = play.days_played + 1;
        tx.execute(
            "UPDATE playthroughs SET days_played = ?, budget_cents = budget_cents - ?, costs_cents = costs_cents + ? WHERE id = ?",
            params![day, expense, expense, play_id],
        )?;
        insert_entry(&tx, play_id, LedgerKind::Expense, None, 0, 0, expense, day, now)?;

        let events = events_conn(&tx, play.scenario_id)?;
        let event = economy.maybe_event(rng, &events).cloned();

        let play = get_play_conn(&tx, user_id, play_id)?;
        tx.commit()?;
        Ok(DayOutcome {
            play,
            expense_cents: expense,
            event,
        })
    }

    /// Finish the run. Profit is frozen as revenue minus costs; meeting
    /// the scenario's target completes the run and pays its rewards,
    /// falling short fails it.
    pub fn end_scenario(
        &self,
        user_id: i64,
        play_id: i64,
        now: DateTime<Utc>,
    ) -> Result<EndOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let play = get_play_conn(&tx, user_id, play_id)?;
        ensure_live(&play)?;
        let scenario =
            get_scenario_conn(&tx, play.scenario_id)?.ok_or(BvkError::NotFound("scenario"))?;

        let final_profit = play.profit_cents();
        let target_met = final_profit >= scenario.target_profit_cents;
        let status = if target_met {
            PlayStatus::Completed
        } else {
            PlayStatus::Failed
        };

        tx.execute(
            "UPDATE playthroughs SET status = ?, final_profit_cents = ?, ended_at = ? WHERE id = ?",
            params![status.as_str(), final_profit, ts(now), play_id],
        )?;

        let mut profile = None;
        let mut newly_awarded = Vec::new();
        let (points, coins) = if target_met {
            let updated = apply_points(&tx, user_id, scenario.points_reward, scenario.coins_reward, now)?;
            let total_completed: i64 = tx.query_row(
                "SELECT COUNT(*) FROM playthroughs WHERE user_id = ? AND status = 'completed'",
                params![user_id],
                |row| row.get(0),
            )?;
            newly_awarded = apply_milestones(
                &tx,
                user_id,
                &[
                    MilestoneEvent::ScenarioCompleted {
                        total: total_completed,
                    },
                    MilestoneEvent::PointsReached {
                        total: updated.total_points,
                    },
                ],
                now,
            )?;
            profile = Some(updated);
            (scenario.points_reward, scenario.coins_reward)
        } else {
            (0, 0)
        };

        let play = get_play_conn(&tx, user_id, play_id)?;
        tx.commit()?;
        Ok(EndOutcome {
            play,
            target_met,
            final_profit_cents: final_profit,
            points_awarded: points,
            coins_awarded: coins,
            profile,
            newly_awarded,
        })
    }
}

// ---- row mappers and conn-level helpers ----

const SCENARIO_COLS: &str = "id, slug, title, description, icon, difficulty, initial_budget_cents, target_profit_cents, duration_label, age_range, points_reward, coins_reward, sort_order, is_active";
const PLAY_COLS: &str = "id, user_id, scenario_id, status, budget_cents, revenue_cents, costs_cents, days_played, final_profit_cents, started_at, ended_at";

/// Prefix each column with a table alias for joins
fn prefixed(cols: &str, alias: &str) -> String {
    cols.split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_scenario(row: &Row) -> rusqlite::Result<Scenario> {
    row_scenario_at(row, 0)
}

fn row_scenario_at(row: &Row, base: usize) -> rusqlite::Result<Scenario> {
    Ok(Scenario {
        id: row.get(base)?,
        slug: row.get(base + 1)?,
        title: row.get(base + 2)?,
        description: row.get(base + 3)?,
        icon: row.get(base + 4)?,
        difficulty: ScenarioDifficulty::parse(&row.get::<_, String>(base + 5)?),
        initial_budget_cents: row.get(base + 6)?,
        target_profit_cents: row.get(base + 7)?,
        duration_label: row.get(base + 8)?,
        age_range: row.get(base + 9)?,
        points_reward: row.get(base + 10)?,
        coins_reward: row.get(base + 11)?,
        sort_order: row.get(base + 12)?,
        is_active: row.get::<_, i64>(base + 13)? != 0,
    })
}

fn row_product(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        scenario_id: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        unit_cost_cents: row.get(4)?,
        suggested_price_cents: row.get(5)?,
    })
}

fn row_event(row: &Row) -> rusqlite::Result<ScenarioEvent> {
    Ok(ScenarioEvent {
        id: row.get(0)?,
        scenario_id: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        weight: row.get(4)?,
    })
}

fn row_play(row: &Row) -> rusqlite::Result<PlayThrough> {
    Ok(PlayThrough {
        id: row.get(0)?,
        user_id: row.get(1)?,
        scenario_id: row.get(2)?,
        status: PlayStatus::parse(&row.get::<_, String>(3)?),
        budget_cents: row.get(4)?,
        revenue_cents: row.get(5)?,
        costs_cents: row.get(6)?,
        days_played: row.get(7)?,
        final_profit_cents: row.get(8)?,
        started_at: parse_ts(&row.get::<_, String>(9)?),
        ended_at: parse_ts_opt(row.get(10)?),
    })
}

fn row_entry(row: &Row) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: row.get(0)?,
        playthrough_id: row.get(1)?,
        kind: LedgerKind::parse(&row.get::<_, String>(2)?),
        product_id: row.get(3)?,
        quantity: row.get(4)?,
        unit_cents: row.get(5)?,
        total_cents: row.get(6)?,
        day: row.get(7)?,
        created_at: parse_ts(&row.get::<_, String>(8)?),
    })
}

fn get_scenario_conn(conn: &Connection, scenario_id: i64) -> Result<Option<Scenario>> {
    let scenario = conn
        .query_row(
            &format!("SELECT {} FROM scenarios WHERE id = ? AND is_active = 1", SCENARIO_COLS),
            params![scenario_id],
            row_scenario,
        )
        .optional()?;
    Ok(scenario)
}

fn products_conn(conn: &Connection, scenario_id: i64) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare(
        "SELECT id, scenario_id, name, icon, unit_cost_cents, suggested_price_cents FROM products WHERE scenario_id = ? ORDER BY id",
    )?;
    let rows = stmt.query_map(params![scenario_id], row_product)?;

    let mut products = Vec::new();
    for row in rows {
        products.push(row?);
    }
    Ok(products)
}

fn events_conn(conn: &Connection, scenario_id: i64) -> Result<Vec<ScenarioEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, scenario_id, description, icon, weight FROM scenario_events WHERE scenario_id = ? ORDER BY id",
    )?;
    let rows = stmt.query_map(params![scenario_id], row_event)?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

/// Load a play-through the caller owns. A missing row and someone
/// else's row look the same from outside.
fn get_play_conn(conn: &Connection, user_id: i64, play_id: i64) -> Result<PlayThrough> {
    conn.query_row(
        &format!("SELECT {} FROM playthroughs WHERE id = ? AND user_id = ?", PLAY_COLS),
        params![play_id, user_id],
        row_play,
    )
    .optional()?
    .ok_or(BvkError::NotFound("play-through"))
}

fn live_play_conn(
    conn: &Connection,
    user_id: i64,
    scenario_id: i64,
) -> Result<Option<PlayThrough>> {
    let play = conn
        .query_row(
            &format!(
                "SELECT {} FROM playthroughs WHERE user_id = ? AND scenario_id = ? AND status = 'in_progress'",
                PLAY_COLS
            ),
            params![user_id, scenario_id],
            row_play,
        )
        .optional()?;
    Ok(play)
}

fn ensure_live(play: &PlayThrough) -> Result<()> {
    if play.status.is_terminal() {
        return Err(BvkError::conflict("play-through has already ended"));
    }
    Ok(())
}

fn product_in_scenario(conn: &Connection, scenario_id: i64, product_id: i64) -> Result<Product> {
    conn.query_row(
        "SELECT id, scenario_id, name, icon, unit_cost_cents, suggested_price_cents FROM products WHERE id = ? AND scenario_id = ?",
        params![product_id, scenario_id],
        row_product,
    )
    .optional()?
    .ok_or(BvkError::NotFound("product"))
}

fn on_hand_conn(conn: &Connection, play_id: i64, product_id: i64) -> Result<i64> {
    let on_hand = conn
        .query_row(
            "SELECT on_hand FROM inventory_items WHERE playthrough_id = ? AND product_id = ?",
            params![play_id, product_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(on_hand.unwrap_or(0))
}

fn inventory_conn(conn: &Connection, play_id: i64) -> Result<Vec<InventoryItem>> {
    let mut stmt = conn.prepare(
        "SELECT playthrough_id, product_id, on_hand FROM inventory_items WHERE playthrough_id = ? ORDER BY product_id",
    )?;
    let rows = stmt.query_map(params![play_id], |row| {
        Ok(InventoryItem {
            playthrough_id: row.get(0)?,
            product_id: row.get(1)?,
            on_hand: row.get(2)?,
        })
    })?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

fn ledger_conn(conn: &Connection, play_id: i64) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, playthrough_id, kind, product_id, quantity, unit_cents, total_cents, day, created_at FROM ledger_entries WHERE playthrough_id = ? ORDER BY id DESC",
    )?;
    let rows = stmt.query_map(params![play_id], row_entry)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

#[allow(clippy::too_many_arguments)]
fn insert_entry(
    conn: &Connection,
    play_id: i64,
    kind: LedgerKind,
    product_id: Option<i64>,
    quantity: i64,
    unit_cents: i64,
    total_cents: i64,
    day: i64,
    now: DateTime<Utc>,
) -> Result<LedgerEntry> {
    conn.execute(
        "INSERT INTO ledger_entries (playthrough_id, kind, product_id, quantity, unit_cents, total_cents, day, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![play_id, kind.as_str(), product_id, quantity, unit_cents, total_cents, day, ts(now)],
    )?;
    Ok(LedgerEntry {
        id: conn.last_insert_rowid(),
        playthrough_id: play_id,
        kind,
        product_id,
        quantity,
        unit_cents,
        total_cents,
        day,
        created_at: now,
    })
}

fn view_conn(conn: &Connection, play: PlayThrough) -> Result<PlayView> {
    let scenario =
        get_scenario_conn(conn, play.scenario_id)?.ok_or(BvkError::NotFound("scenario"))?;
    let products = products_conn(conn, play.scenario_id)?;
    let inventory = inventory_conn(conn, play.id)?;
    let ledger = ledger_conn(conn, play.id)?;
    Ok(PlayView {
        play,
        scenario,
        products,
        inventory,
        ledger,
    })
}
