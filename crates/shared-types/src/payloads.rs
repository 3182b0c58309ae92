//! # Typed Payloads
//!
//! One struct per message `kind`. Every field defaults when absent so that a
//! partially populated payload still yields a value; a payload that does not
//! match at all surfaces downstream as default data, not as an error.
//!
//! | kind            | channel     | type                |
//! |-----------------|-------------|---------------------|
//! | `tick`          | `market`    | [`PriceTick`]         |
//! | `portfolio`     | `portfolio` | [`PortfolioSnapshot`] |
//! | `risk`          | `portfolio` | [`RiskMetrics`]       |
//! | `order`         | `orders`    | [`OrderUpdate`]       |
//! | `fill`          | `orders`    | [`Fill`]              |
//! | `alert`         | `system`    | [`Alert`]             |
//! | `engine_status` | `system`    | [`EngineStatus`]      |

use serde::{Deserialize, Serialize};

/// Last traded price for a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTick {
    pub symbol: String,
    pub price: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub volume: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// A held position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

/// Portfolio state pushed once per second or on bar close.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSnapshot {
    pub equity: f64,
    pub cash: f64,
    pub session_start_equity: f64,
    pub equity_peak: f64,
    pub positions: Vec<Position>,
}

/// Aggregate risk figures for the risk sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskMetrics {
    /// Fractional drawdown from the equity peak.
    pub drawdown: f64,
    pub gross_exposure: f64,
    pub net_exposure: f64,
    /// Total open risk as a fraction of equity.
    pub portfolio_heat: f64,
    pub daily_pnl: f64,
    pub value_at_risk: f64,
}

/// Order lifecycle update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderUpdate {
    pub order_id: String,
    pub symbol: String,
    pub side: String,
    pub quantity: f64,
    pub filled_quantity: f64,
    pub limit_price: Option<f64>,
    pub status: String,
}

/// Execution report for a (partial) fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fill {
    pub order_id: String,
    pub symbol: String,
    pub side: String,
    pub quantity: f64,
    pub price: f64,
    pub timestamp: u64,
}

/// Operator alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    pub severity: String,
    pub source: String,
    pub message: String,
    pub timestamp: u64,
}

/// System operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Live,
    #[default]
    Paper,
    Backtest,
}

/// Strategy engine lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineState {
    Running,
    #[default]
    Paused,
    Halted,
}

/// Engine status heartbeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineStatus {
    pub mode: Mode,
    pub engine_state: EngineState,
    pub kill_switch_active: bool,
}
