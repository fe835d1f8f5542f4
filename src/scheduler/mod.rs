//! Wall-clock triggers for the daily and hourly cycles
//!
//! An in-process stand-in for a cron daemon: the scheduler sleeps until the
//! next configured trigger (daily at a fixed UTC time, hourly at a fixed
//! minute past the hour), runs the corresponding cycle, and goes back to
//! sleep. Cycles never overlap — the loop is strictly serial, so the dedup
//! tables and favourites lists see exactly one active call path at a time.
//!
//! # Quick Start
//!
//! ```ignore
//! use dndwatch::scheduler::{Scheduler, TriggerConfig};
//!
//! let scheduler = Scheduler::new(TriggerConfig::default(), dispatcher)?;
//! scheduler.start().await?;
//! ```

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::dispatch::{CycleKind, Dispatcher};
use crate::error::{Error, Result};

// ============================================================================
// Trigger Configuration
// ============================================================================

/// Configuration for the cycle triggers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Time of day (UTC, 24h "HH:MM") to run the daily cycle
    pub daily_time: String,

    /// Minute past each hour to run the hourly cycle
    pub hourly_minute: u32,

    /// Run both cycles once on startup, before entering the loop
    pub run_on_startup: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            daily_time: "03:00".to_string(),
            hourly_minute: 5,
            run_on_startup: true,
        }
    }
}

impl TriggerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if NaiveTime::parse_from_str(&self.daily_time, "%H:%M").is_err() {
            return Err(Error::config(format!(
                "Invalid daily_time '{}'. Expected HH:MM",
                self.daily_time
            )));
        }
        if self.hourly_minute > 59 {
            return Err(Error::config(format!(
                "Invalid hourly_minute '{}'. Must be 0-59",
                self.hourly_minute
            )));
        }
        Ok(())
    }

    /// Parse the daily trigger time
    pub fn parse_daily_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_time, "%H:%M")
            .map_err(|_| Error::config(format!("Invalid daily_time: {}", self.daily_time)))
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Serial cycle scheduler driven by the wall clock
pub struct Scheduler {
    config: TriggerConfig,
    dispatcher: Dispatcher,
    is_running: Arc<RwLock<bool>>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(config: TriggerConfig, dispatcher: Dispatcher) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            dispatcher,
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Duration until the next daily trigger after `now`
    pub fn duration_until_daily(&self, now: DateTime<Utc>) -> Result<Duration> {
        let daily_time = self.config.parse_daily_time()?;
        let target_today = now.date_naive().and_time(daily_time).and_utc();

        if now < target_today {
            Ok(target_today - now)
        } else {
            Ok(target_today + Duration::days(1) - now)
        }
    }

    /// Duration until the next hourly trigger after `now`
    pub fn duration_until_hourly(&self, now: DateTime<Utc>) -> Duration {
        let this_hour = now
            .with_minute(self.config.hourly_minute)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);

        if now < this_hour {
            this_hour - now
        } else {
            this_hour + Duration::hours(1) - now
        }
    }

    /// The next trigger to fire after `now`
    ///
    /// Ties between the two triggers go to the daily cycle.
    pub fn next_trigger(&self, now: DateTime<Utc>) -> Result<(CycleKind, Duration)> {
        let until_daily = self.duration_until_daily(now)?;
        let until_hourly = self.duration_until_hourly(now);

        if until_daily <= until_hourly {
            Ok((CycleKind::Daily, until_daily))
        } else {
            Ok((CycleKind::Hourly, until_hourly))
        }
    }

    /// Start the trigger loop (runs until stopped)
    pub async fn start(&self) -> Result<()> {
        *self.is_running.write().await = true;

        if self.config.run_on_startup {
            tracing::info!("Executing startup test run");
            self.dispatcher.run_cycle(CycleKind::Daily).await;
            self.dispatcher.run_cycle(CycleKind::Hourly).await;
            tracing::info!("Test run finished, entering trigger loop");
        }

        while *self.is_running.read().await {
            let (kind, sleep_for) = self.next_trigger(Utc::now())?;
            tracing::debug!(
                cycle = %kind,
                seconds = sleep_for.num_seconds(),
                "Sleeping until next trigger"
            );

            tokio::select! {
                _ = tokio::time::sleep(
                    sleep_for.to_std().unwrap_or(std::time::Duration::from_secs(60))
                ) => {
                    self.dispatcher.run_cycle(kind).await;
                }
                _ = self.wait_for_stop() => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Stop the trigger loop
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    // Internal: wait for stop signal
    async fn wait_for_stop(&self) {
        loop {
            if !*self.is_running.read().await {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
