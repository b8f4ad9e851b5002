//! The simulation loop.

use tracing::{debug, info, trace};

use crate::callback::{CallbackChain, Quote};
use crate::domain::{Direction, FeeSchedule, MarketObservation, Trade};
use crate::error::{ConfigError, EngineError};
use crate::ledger::Ledger;
use crate::report::{render_report, ReportSummary};

use super::config::EngineConfig;

/// Owns the input, the callback chain and the ledger of one simulation.
///
/// The engine is single-use: [`run`](Self::run) appends to the same ledger
/// every time it is called, so a second call books every trade again.
#[derive(Debug)]
pub struct BacktestEngine {
    observations: Vec<MarketObservation>,
    config: EngineConfig,
    callbacks: CallbackChain,
    ledger: Ledger,
    computed: bool,
}

impl BacktestEngine {
    /// Create an engine. Fails fast on invalid configuration.
    pub fn new(
        observations: Vec<MarketObservation>,
        config: EngineConfig,
        callbacks: CallbackChain,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if callbacks.is_empty() {
            return Err(ConfigError::EmptyCallbackChain);
        }
        let ledger = Ledger::new(config.initial_cash);
        Ok(Self {
            observations,
            config,
            callbacks,
            ledger,
            computed: false,
        })
    }

    /// Default configuration with the given chain.
    pub fn with_callbacks(
        observations: Vec<MarketObservation>,
        callbacks: CallbackChain,
    ) -> Result<Self, ConfigError> {
        Self::new(observations, EngineConfig::default(), callbacks)
    }

    /// Walk every observation in input order and book the resulting trades.
    ///
    /// Skipped trades (not enough cash, nothing held) are not errors. A
    /// callback returning a negative or non-finite size aborts the run; the
    /// trades booked before that point stay in the ledger.
    pub fn run(&mut self) -> Result<&Ledger, EngineError> {
        let Self {
            observations,
            config,
            callbacks,
            ledger,
            computed,
        } = self;

        for obs in observations.iter() {
            buy_step(obs, &config.fees, callbacks, ledger)?;
            sell_step(obs, &config.fees, callbacks, ledger)?;
        }
        *computed = true;

        info!(
            observations = observations.len(),
            trades = ledger.len(),
            cash = ledger.available_cash(),
            "backtest complete"
        );
        Ok(ledger)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn callbacks(&self) -> &CallbackChain {
        &self.callbacks
    }

    pub fn observations(&self) -> &[MarketObservation] {
        &self.observations
    }

    /// Whether [`run`](Self::run) has completed at least once.
    pub fn is_computed(&self) -> bool {
        self.computed
    }

    /// Structured summary, `None` before the simulation has run.
    pub fn summary(&self) -> Option<ReportSummary> {
        ReportSummary::from_engine(self)
    }

    /// Human-readable report, or a placeholder before the simulation has run.
    pub fn report(&self) -> String {
        render_report(self)
    }
}

fn check_size(callback: &str, side: Direction, amount: f64) -> Result<f64, EngineError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(EngineError::InvalidSize {
            callback: callback.to_string(),
            side,
            amount,
        })
    }
}

fn buy_step(
    obs: &MarketObservation,
    fees: &FeeSchedule,
    callbacks: &CallbackChain,
    ledger: &mut Ledger,
) -> Result<(), EngineError> {
    let quote = Quote {
        date: obs.date,
        code: &obs.code,
        price: obs.price,
        cash: ledger.available_cash(),
    };
    let Some(trigger) = callbacks.buy_trigger(&quote) else {
        return Ok(());
    };
    let Some((sizer, amount)) = callbacks.buy_size(&quote) else {
        trace!(
            date = %obs.date,
            code = %obs.code,
            trigger = trigger.name(),
            "no buy size, skipped"
        );
        return Ok(());
    };
    let amount = check_size(sizer, Direction::Buy, amount)?;

    let commission = fees.commission(obs.price, amount);
    let tax = fees.tax(obs.price, amount);
    let value = fees.buy_cost(obs.price, amount);
    if value > quote.cash {
        trace!(
            date = %obs.date,
            code = %obs.code,
            price = obs.price,
            cash = quote.cash,
            "insufficient cash, buy skipped"
        );
        return Ok(());
    }

    let cash_after = quote.cash - value;
    ledger.append(Trade::new(
        obs.date,
        obs.code.as_str(),
        obs.price,
        amount,
        cash_after,
        commission,
        tax,
        Direction::Buy,
    ));
    debug!(
        date = %obs.date,
        code = %obs.code,
        price = obs.price,
        amount,
        cash = cash_after,
        trigger = trigger.name(),
        sizer,
        "buy"
    );
    Ok(())
}

fn sell_step(
    obs: &MarketObservation,
    fees: &FeeSchedule,
    callbacks: &CallbackChain,
    ledger: &mut Ledger,
) -> Result<(), EngineError> {
    let quote = Quote {
        date: obs.date,
        code: &obs.code,
        price: obs.price,
        cash: ledger.available_cash(),
    };
    let holding = ledger.holding(&obs.code);
    let Some(trigger) = callbacks.sell_trigger(&quote, holding) else {
        return Ok(());
    };
    if ledger.cost_basis(&obs.code).is_none() {
        trace!(date = %obs.date, code = %obs.code, "no holding, sell skipped");
        return Ok(());
    }
    let Some((sizer, amount)) = callbacks.sell_size(&quote, holding) else {
        trace!(
            date = %obs.date,
            code = %obs.code,
            trigger = trigger.name(),
            "no sell size, skipped"
        );
        return Ok(());
    };
    let amount = check_size(sizer, Direction::Sell, amount)?;

    let commission = fees.commission(obs.price, amount);
    let tax = fees.tax(obs.price, amount);
    let value = fees.sell_proceeds(obs.price, amount);
    let cash_after = quote.cash + value;
    // Fees larger than the proceeds must still be payable.
    if cash_after < 0.0 {
        trace!(
            date = %obs.date,
            code = %obs.code,
            price = obs.price,
            cash = quote.cash,
            "fees exceed cash, sell skipped"
        );
        return Ok(());
    }

    ledger.append(Trade::new(
        obs.date,
        obs.code.as_str(),
        obs.price,
        amount,
        cash_after,
        commission,
        tax,
        Direction::Sell,
    ));
    debug!(
        date = %obs.date,
        code = %obs.code,
        price = obs.price,
        amount,
        cash = cash_after,
        trigger = trigger.name(),
        sizer,
        "sell"
    );
    Ok(())
}
