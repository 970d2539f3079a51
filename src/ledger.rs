use chrono::{NaiveDate, Utc};
use log::{debug, info};

use crate::error::{JournalError, Result};
use crate::models::{
    Action, CreateTradeInput, Decision, DecisionInput, FundMovement, FundMovementInput,
    FundMovementType, Settings, TemplateInput, Trade, TradeTemplate, UpdateSettingsInput,
    UpdateTradeInput,
};
use crate::models::trade::{SENTIMENT_RANGE, normalize_tags};

/// Generate an id of the form `PREFIX-<unix millis>-<uuid>`.
fn generate_id(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4()
    )
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(JournalError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn require_positive(value: f64, field: &str) -> Result<()> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(JournalError::validation(format!(
            "{} must be a positive number, got {}",
            field, value
        )));
    }
    Ok(())
}

fn require_sentiment(sentiment: u8) -> Result<()> {
    if !SENTIMENT_RANGE.contains(&sentiment) {
        return Err(JournalError::validation(format!(
            "Sentiment must be between {} and {}, got {}",
            SENTIMENT_RANGE.start(),
            SENTIMENT_RANGE.end(),
            sentiment
        )));
    }
    Ok(())
}

/// Re-raise a validation failure found in persisted data as a format error
/// naming the offending record.
fn stored(result: Result<()>, record: &str) -> Result<()> {
    result.map_err(|e| match e {
        JournalError::Validation(message) => {
            JournalError::Format(format!("{}: {}", record, message))
        }
        other => other,
    })
}

fn validate_decision(input: &DecisionInput) -> Result<(NaiveDate, Action)> {
    let date = input
        .date
        .ok_or_else(|| JournalError::validation("Decision date is required"))?;
    let action = input.action.parse::<Action>()?;
    require_positive(input.quantity, "Quantity")?;
    require_positive(input.price, "Price")?;
    Ok((date, action))
}

fn trimmed_words(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Authoritative collection of trades, fund movements, templates and settings.
///
/// All mutations validate their input before touching any state, so a
/// rejected call leaves the ledger exactly as it was. Trades only change
/// through methods that finish with a recalculation of their derived fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    trades: Vec<Trade>,
    fund_movements: Vec<FundMovement>,
    templates: Vec<TradeTemplate>,
    settings: Settings,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Rebuild a ledger from persisted parts. Stored records are held to the
    /// same rules as new input, and every trade's derived fields are
    /// recomputed rather than trusted.
    pub(crate) fn from_parts(
        mut trades: Vec<Trade>,
        fund_movements: Vec<FundMovement>,
        templates: Vec<TradeTemplate>,
        settings: Settings,
    ) -> Result<Self> {
        for trade in &mut trades {
            let record = format!("Trade {}", trade.id);
            stored(require_positive(trade.initial_risk, "Initial risk"), &record)?;
            stored(require_sentiment(trade.sentiment), &record)?;
            for decision in trade.decisions() {
                let record = format!("{} decision {}", record, decision.id);
                stored(require_positive(decision.quantity, "Quantity"), &record)?;
                stored(require_positive(decision.price, "Price"), &record)?;
            }
            trade.recalculate();
        }
        for movement in &fund_movements {
            let record = format!("Fund movement {}", movement.id);
            stored(require_positive(movement.amount, "Amount"), &record)?;
        }

        Ok(Self {
            trades,
            fund_movements,
            templates,
            settings,
        })
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trade(&self, id: &str) -> Result<&Trade> {
        self.trades
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| JournalError::not_found("Trade", id))
    }

    pub fn fund_movements(&self) -> &[FundMovement] {
        &self.fund_movements
    }

    pub fn templates(&self) -> &[TradeTemplate] {
        &self.templates
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn trade_index(&self, id: &str) -> Result<usize> {
        self.trades
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| JournalError::not_found("Trade", id))
    }

    pub fn add_trade(&mut self, input: CreateTradeInput) -> Result<&Trade> {
        require_text(&input.symbol, "Symbol")?;
        require_text(&input.setup, "Setup")?;
        require_text(&input.situation, "Situation")?;
        require_positive(input.initial_risk, "Initial risk")?;
        if let Some(sentiment) = input.sentiment {
            require_sentiment(sentiment)?;
        }

        let created_date = input.created_date.unwrap_or_else(today);
        let trade = Trade::new(generate_id("TRADE"), input, created_date);
        info!("Added trade {} ({})", trade.id, trade.symbol);

        self.trades.push(trade);
        Ok(&self.trades[self.trades.len() - 1])
    }

    pub fn update_trade(&mut self, id: &str, patch: UpdateTradeInput) -> Result<&Trade> {
        let index = self.trade_index(id)?;

        if let Some(symbol) = &patch.symbol {
            require_text(symbol, "Symbol")?;
        }
        if let Some(setup) = &patch.setup {
            require_text(setup, "Setup")?;
        }
        if let Some(situation) = &patch.situation {
            require_text(situation, "Situation")?;
        }
        if let Some(risk) = patch.initial_risk {
            require_positive(risk, "Initial risk")?;
        }
        if let Some(sentiment) = patch.sentiment {
            require_sentiment(sentiment)?;
        }

        let trade = &mut self.trades[index];
        if let Some(symbol) = patch.symbol {
            trade.symbol = symbol.trim().to_uppercase();
        }
        if let Some(setup) = patch.setup {
            trade.setup = setup.trim().to_string();
        }
        if let Some(situation) = patch.situation {
            trade.situation = situation.trim().to_string();
        }
        if let Some(tags) = patch.tags {
            trade.tags = normalize_tags(tags);
        }
        if let Some(risk) = patch.initial_risk {
            trade.initial_risk = risk;
        }
        if let Some(followed) = patch.all_rules_followed {
            trade.all_rules_followed = followed;
        }
        if let Some(sentiment) = patch.sentiment {
            trade.sentiment = sentiment;
        }
        if let Some(notes) = patch.notes {
            trade.notes = notes.trim().to_string();
        }
        trade.recalculate();

        debug!("Updated trade {}", id);
        Ok(&self.trades[index])
    }

    pub fn delete_trade(&mut self, id: &str) -> Result<Trade> {
        let index = self.trade_index(id)?;
        let trade = self.trades.remove(index);
        info!("Deleted trade {} ({})", trade.id, trade.symbol);
        Ok(trade)
    }

    pub fn duplicate_trade(&mut self, id: &str) -> Result<&Trade> {
        let index = self.trade_index(id)?;
        let copy = self.trades[index].duplicate(generate_id("TRADE"), today());
        info!("Duplicated trade {} as {}", id, copy.id);

        self.trades.push(copy);
        Ok(&self.trades[self.trades.len() - 1])
    }

    pub fn add_decision(&mut self, trade_id: &str, input: DecisionInput) -> Result<&Trade> {
        let index = self.trade_index(trade_id)?;
        let (date, action) = validate_decision(&input)?;

        let decision = Decision {
            id: generate_id("DEC"),
            date,
            action,
            quantity: input.quantity,
            price: input.price,
            comments: input.comments.trim().to_string(),
        };

        let trade = &mut self.trades[index];
        trade.push_decision(decision);
        debug!(
            "Trade {}: {} {} @ {} -> {} (net qty {}, P/L {})",
            trade.id,
            action,
            input.quantity,
            input.price,
            trade.status(),
            trade.net_quantity(),
            trade.net_pnl()
        );

        Ok(&self.trades[index])
    }

    pub fn remove_decision(&mut self, trade_id: &str, decision_id: &str) -> Result<&Trade> {
        let index = self.trade_index(trade_id)?;
        self.trades[index]
            .remove_decision(decision_id)
            .ok_or_else(|| JournalError::not_found("Decision", decision_id))?;

        debug!("Removed decision {} from trade {}", decision_id, trade_id);
        Ok(&self.trades[index])
    }

    pub fn add_fund_movement(&mut self, input: FundMovementInput) -> Result<&FundMovement> {
        require_positive(input.amount, "Amount")?;
        let movement_type = input.movement_type.parse::<FundMovementType>()?;

        let movement = FundMovement {
            id: generate_id("FUND"),
            date: input.date.unwrap_or_else(today),
            amount: input.amount,
            movement_type,
            comments: input.comments.trim().to_string(),
        };
        info!(
            "Added fund movement {} ({} {:.2})",
            movement.id, movement.movement_type, movement.amount
        );

        self.fund_movements.push(movement);
        Ok(&self.fund_movements[self.fund_movements.len() - 1])
    }

    pub fn delete_fund_movement(&mut self, id: &str) -> Result<FundMovement> {
        let index = self
            .fund_movements
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| JournalError::not_found("Fund movement", id))?;

        let movement = self.fund_movements.remove(index);
        info!("Deleted fund movement {}", movement.id);
        Ok(movement)
    }

    /// Merge a settings patch. A starting balance is only accepted on first
    /// launch; it is recorded as a `StartingBalance` fund movement and ends
    /// the first-launch state.
    pub fn update_settings(&mut self, patch: UpdateSettingsInput) -> Result<&Settings> {
        if let Some(balance) = patch.starting_balance {
            if !self.settings.is_first_launch {
                return Err(JournalError::validation(
                    "Starting balance can only be set on first launch",
                ));
            }
            if !(balance >= 0.0 && balance.is_finite()) {
                return Err(JournalError::validation(format!(
                    "Starting balance must be zero or positive, got {}",
                    balance
                )));
            }
        }
        if let Some(month) = patch.fiscal_year_start {
            if !(1..=12).contains(&month) {
                return Err(JournalError::validation(format!(
                    "Fiscal year start must be a month between 1 and 12, got {}",
                    month
                )));
            }
        }

        let settings = &mut self.settings;
        settings.default_setups.extend(trimmed_words(&patch.add_setups));
        settings.default_situations.extend(trimmed_words(&patch.add_situations));
        settings.default_tags.extend(trimmed_words(&patch.add_tags));
        for word in trimmed_words(&patch.remove_setups) {
            settings.default_setups.remove(&word);
        }
        for word in trimmed_words(&patch.remove_situations) {
            settings.default_situations.remove(&word);
        }
        for word in trimmed_words(&patch.remove_tags) {
            settings.default_tags.remove(&word);
        }
        if let Some(theme) = patch.theme {
            settings.theme = theme;
        }
        if let Some(month) = patch.fiscal_year_start {
            settings.fiscal_year_start = month;
        }

        if let Some(balance) = patch.starting_balance {
            settings.starting_balance = balance;
            settings.is_first_launch = false;
            if balance > 0.0 {
                self.fund_movements.push(FundMovement {
                    id: generate_id("FUND"),
                    date: today(),
                    amount: balance,
                    movement_type: FundMovementType::StartingBalance,
                    comments: "Starting balance".to_string(),
                });
            }
            info!("Starting balance set to {:.2}", balance);
        }

        Ok(&self.settings)
    }

    pub fn add_template(&mut self, input: TemplateInput) -> Result<&TradeTemplate> {
        require_text(&input.name, "Template name")?;
        require_text(&input.setup, "Setup")?;

        let template = TradeTemplate {
            id: generate_id("TPL"),
            name: input.name.trim().to_string(),
            setup: input.setup.trim().to_string(),
            situation: input.situation.trim().to_string(),
            tags: normalize_tags(input.tags),
            notes: input.notes.trim().to_string(),
        };
        debug!("Added template {} ({})", template.id, template.name);

        self.templates.push(template);
        Ok(&self.templates[self.templates.len() - 1])
    }

    pub fn delete_template(&mut self, id: &str) -> Result<TradeTemplate> {
        let index = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| JournalError::not_found("Template", id))?;
        Ok(self.templates.remove(index))
    }

    /// Prefill a new trade from a template. The result still goes through
    /// [`Ledger::add_trade`] validation.
    pub fn trade_input_from_template(
        &self,
        template_id: &str,
        symbol: &str,
        initial_risk: f64,
    ) -> Result<CreateTradeInput> {
        let template = self
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .ok_or_else(|| JournalError::not_found("Template", template_id))?;

        Ok(CreateTradeInput {
            symbol: symbol.to_string(),
            setup: template.setup.clone(),
            situation: template.situation.clone(),
            tags: template.tags.iter().cloned().collect(),
            initial_risk,
            all_rules_followed: false,
            sentiment: None,
            notes: template.notes.clone(),
            created_date: None,
        })
    }
}
