//! Recurring-interval scheduler.
//!
//! The scheduler owns every [`EpochInfo`] record and is the only component
//! that mutates them. On each state transition [`EpochsKeeper::begin_tick`]
//! walks the tracked intervals in identifier order and decides, per interval,
//! whether counting starts, an epoch boundary crossed, or nothing happened.
//! Subscribers are notified through the ordered [`EpochHooks`] chain.

use tideflow_types::{attr, event_type, EpochInfo, Event, Result};

use crate::{keys, Context};

/// Epoch boundary subscriber.
///
/// Both callbacks default to no-ops so subscribers implement only the side
/// they care about. Errors are logged by the scheduler and never abort the
/// transition or the remaining subscribers.
pub trait EpochHooks {
    /// Invoked after an epoch has started, including the first one.
    fn before_epoch_start(
        &self,
        _ctx: &mut Context<'_>,
        _identifier: &str,
        _epoch: u64,
    ) -> Result<()> {
        Ok(())
    }

    /// Invoked after an epoch has ended, with the *new* epoch number.
    fn after_epoch_end(
        &self,
        _ctx: &mut Context<'_>,
        _identifier: &str,
        _epoch: u64,
    ) -> Result<()> {
        Ok(())
    }
}

/// Scheduler for named recurring intervals.
pub struct EpochsKeeper {
    /// Subscribers in registration order. The order is part of the public
    /// contract: callers wire it explicitly and it must be stable across
    /// runs.
    hooks: Vec<Box<dyn EpochHooks>>,
}

impl Default for EpochsKeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl EpochsKeeper {
    /// Creates a scheduler with no subscribers.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Appends a subscriber to the notification chain.
    pub fn register_hook(&mut self, hook: Box<dyn EpochHooks>) {
        self.hooks.push(hook);
    }

    /// Number of registered subscribers.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Reads one epoch record.
    pub fn epoch_info(&self, ctx: &Context<'_>, identifier: &str) -> Result<Option<EpochInfo>> {
        match ctx.get_raw(&keys::epoch_info_key(identifier)) {
            Some(bytes) => Ok(Some(EpochInfo::decode_compat(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Writes one epoch record.
    pub fn set_epoch_info(&self, ctx: &mut Context<'_>, info: &EpochInfo) -> Result<()> {
        ctx.set_value(keys::epoch_info_key(&info.identifier), info)
    }

    /// Deletes one epoch record.
    pub fn delete_epoch_info(&self, ctx: &mut Context<'_>, identifier: &str) {
        ctx.delete_raw(&keys::epoch_info_key(identifier));
    }

    /// All epoch records, in identifier order.
    pub fn all_epoch_infos(&self, ctx: &Context<'_>) -> Result<Vec<EpochInfo>> {
        ctx.prefix_scan(&keys::epoch_info_prefix())
            .into_iter()
            .map(|(_, bytes)| EpochInfo::decode_compat(&bytes).map_err(Into::into))
            .collect()
    }

    /// Advances every tracked interval for the current transition.
    ///
    /// Per interval, exactly one of three things happens:
    ///
    /// - counting has not started and `time >= start_time`: the first epoch
    ///   begins (counter 1, start time pinned to the *configured* start)
    /// - counting has started and `time > current start + duration`: the
    ///   epoch ends and the next begins; the new start time advances by
    ///   exactly one duration so boundaries never drift
    /// - otherwise: no-op, which makes repeated ticks within one interval
    ///   idempotent
    pub fn begin_tick(&self, ctx: &mut Context<'_>) -> Result<()> {
        for mut info in self.all_epoch_infos(ctx)? {
            if !info.epoch_counting_started {
                if ctx.time() >= info.start_time {
                    info.epoch_counting_started = true;
                    info.current_epoch = 1;
                    info.current_epoch_start_time = info.start_time;
                    info.current_epoch_start_height = ctx.height();
                    self.set_epoch_info(ctx, &info)?;
                    tracing::debug!(
                        identifier = %info.identifier,
                        height = ctx.height(),
                        "starting epoch counting"
                    );
                    self.emit_start(ctx, &info);
                    self.notify_before(ctx, &info.identifier, info.current_epoch);
                }
                continue;
            }

            let end = match info.current_epoch_end() {
                Some(end) => end,
                None => continue,
            };
            if ctx.time() > end {
                info.current_epoch += 1;
                info.current_epoch_start_time = end;
                info.current_epoch_start_height = ctx.height();
                self.set_epoch_info(ctx, &info)?;
                tracing::debug!(
                    identifier = %info.identifier,
                    epoch = info.current_epoch,
                    height = ctx.height(),
                    "epoch boundary crossed"
                );
                ctx.emit(
                    Event::new(event_type::EPOCH_END)
                        .attr(attr::EPOCH_IDENTIFIER, &info.identifier)
                        .attr(attr::EPOCH_NUMBER, info.current_epoch),
                );
                self.notify_after(ctx, &info.identifier, info.current_epoch);
                self.emit_start(ctx, &info);
                self.notify_before(ctx, &info.identifier, info.current_epoch);
            }
        }
        Ok(())
    }

    fn emit_start(&self, ctx: &mut Context<'_>, info: &EpochInfo) {
        ctx.emit(
            Event::new(event_type::EPOCH_START)
                .attr(attr::EPOCH_IDENTIFIER, &info.identifier)
                .attr(attr::EPOCH_NUMBER, info.current_epoch),
        );
    }

    fn notify_before(&self, ctx: &mut Context<'_>, identifier: &str, epoch: u64) {
        for hook in &self.hooks {
            if let Err(err) = hook.before_epoch_start(ctx, identifier, epoch) {
                tracing::error!(
                    identifier,
                    epoch,
                    error = %err,
                    "before-epoch-start hook failed"
                );
            }
        }
    }

    fn notify_after(&self, ctx: &mut Context<'_>, identifier: &str, epoch: u64) {
        for hook in &self.hooks {
            if let Err(err) = hook.after_epoch_end(ctx, identifier, epoch) {
                tracing::error!(
                    identifier,
                    epoch,
                    error = %err,
                    "after-epoch-end hook failed"
                );
            }
        }
    }
}
