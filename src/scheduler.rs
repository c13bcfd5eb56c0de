use crate::func_unit::{CapabilityError, Pool};
use crate::{op::OperationClass, Cycle};
use console::style;
use std::collections::VecDeque;

/// A ready instruction waiting to be bound to a functional unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueRequest {
    /// Instruction identifier assigned by the upstream pipeline.
    pub id: u64,
    pub op: OperationClass,
}

impl IssueRequest {
    #[must_use]
    pub fn new(id: u64, op: impl Into<OperationClass>) -> Self {
        Self { id, op: op.into() }
    }
}

impl std::fmt::Display for IssueRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[id={}]", self.op, self.id)
    }
}

/// A request bound to a functional unit replica until completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub request: IssueRequest,
    pub unit: usize,
    pub issued_at: Cycle,
    pub completes_at: Cycle,
    /// Global issue order; breaks ties between same-cycle completions.
    pub issue_order: u64,
}

/// Diagnostic for a request no instantiated unit class can ever serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuckInstruction {
    pub request: IssueRequest,
    pub cycle: Cycle,
    pub error: CapabilityError,
}

/// Everything one issue pass produced.
#[derive(Debug, Default)]
pub struct IssueOutcome {
    pub reservations: Vec<Reservation>,
    pub stuck: Vec<StuckInstruction>,
}

/// Binds ready instructions to functional units, oldest first.
///
/// The pending set is kept in submission order (program order); that order is
/// the issue priority, so a given request stream schedules identically on
/// every run.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: VecDeque<(u64, IssueRequest)>,
    next_seq: u64,
    next_issue_order: u64,
    pub stats: stats::Scheduler,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a ready instruction behind all earlier submissions.
    pub fn submit(&mut self, request: IssueRequest) {
        let seq = self.next_seq;
        self.next_seq += 1;
        log::trace!("scheduler: submit {} (seq {})", request, seq);
        self.pending.push_back((seq, request));
    }

    #[must_use]
    pub fn num_pending(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }

    /// One issue pass over the pending set, in program order.
    ///
    /// A request that finds no free capable unit stays pending and is retried
    /// next cycle; that stall is backpressure, not an error. A request whose
    /// operation class no instantiated class lists is removed and reported
    /// once, instead of stalling forever.
    pub fn issue(&mut self, pool: &mut Pool, cycle: Cycle) -> IssueOutcome {
        let mut outcome = IssueOutcome::default();
        let mut still_pending = VecDeque::with_capacity(self.pending.len());

        for (seq, request) in self.pending.drain(..) {
            if !pool.has_capable_class(&request.op) {
                let error = CapabilityError::Unschedulable {
                    op: request.op.clone(),
                };
                log::warn!(
                    "{} {} can never issue: {}",
                    style(format!("cycle {cycle:03} issue:")).red(),
                    request,
                    error,
                );
                self.stats.num_unschedulable += 1;
                outcome.stuck.push(StuckInstruction {
                    request,
                    cycle,
                    error,
                });
                continue;
            }

            let Some(unit) = pool.find_capable_free_instance(&request.op, cycle) else {
                // structural hazard, retry next cycle
                self.stats.issue_structural_hazard_stall += 1;
                still_pending.push_back((seq, request));
                continue;
            };

            let completes_at = pool
                .reserve(unit, &request.op, cycle)
                .expect("unit returned by find_capable_free_instance accepts the op");
            let issue_order = self.next_issue_order;
            self.next_issue_order += 1;
            self.stats.num_issued += 1;

            log::debug!(
                "{} {} -> fu[{:03}] {} (completes at {})",
                style(format!("cycle {cycle:03} issue:")).red(),
                request,
                unit,
                pool.class_name(unit),
                completes_at,
            );

            outcome.reservations.push(Reservation {
                request,
                unit,
                issued_at: cycle,
                completes_at,
                issue_order,
            });
        }

        self.pending = still_pending;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::{IssueRequest, Scheduler};
    use crate::config::{FuDesc, Machine, OpDesc};
    use crate::func_unit::{CapabilityError, Pool};
    use color_eyre::eyre;

    fn single_alu() -> Machine {
        Machine::new([
            FuDesc::new("IntALU", [OpDesc::new("IntAlu")], 1),
            FuDesc::new("ReadPort", [OpDesc::new("MemRead")], 0),
        ])
    }

    #[test]
    fn issues_in_program_order() -> eyre::Result<()> {
        let mut pool = Pool::new(&single_alu())?;
        let mut scheduler = Scheduler::new();
        scheduler.submit(IssueRequest::new(10, "IntAlu"));
        scheduler.submit(IssueRequest::new(11, "IntAlu"));

        let outcome = scheduler.issue(&mut pool, 0);
        assert_eq!(outcome.reservations.len(), 1);
        assert_eq!(outcome.reservations[0].request.id, 10);
        assert_eq!(scheduler.num_pending(), 1);

        pool.release_expired(1);
        let outcome = scheduler.issue(&mut pool, 1);
        assert_eq!(outcome.reservations[0].request.id, 11);
        assert!(scheduler.is_drained());
        assert_eq!(scheduler.stats.num_issued, 2);
        assert_eq!(scheduler.stats.issue_structural_hazard_stall, 1);
        Ok(())
    }

    #[test]
    fn a_request_is_never_bound_twice() -> eyre::Result<()> {
        let mut pool = Pool::new(&single_alu())?;
        let mut scheduler = Scheduler::new();
        scheduler.submit(IssueRequest::new(0, "IntAlu"));

        let first = scheduler.issue(&mut pool, 0);
        assert_eq!(first.reservations.len(), 1);
        // drained: re-running the pass cannot issue the same request again
        let second = scheduler.issue(&mut pool, 0);
        assert!(second.reservations.is_empty());
        Ok(())
    }

    #[test]
    fn unmatched_requests_are_reported_once_not_retried() -> eyre::Result<()> {
        let mut pool = Pool::new(&single_alu())?;
        let mut scheduler = Scheduler::new();
        scheduler.submit(IssueRequest::new(0, "MemRead"));
        scheduler.submit(IssueRequest::new(1, "SimdSqrt"));

        let outcome = scheduler.issue(&mut pool, 0);
        assert_eq!(outcome.stuck.len(), 2);
        assert_eq!(
            outcome.stuck[0].error,
            CapabilityError::Unschedulable {
                op: "MemRead".into(),
            }
        );
        assert!(scheduler.is_drained());
        assert_eq!(scheduler.stats.num_unschedulable, 2);

        let outcome = scheduler.issue(&mut pool, 1);
        assert!(outcome.stuck.is_empty());
        Ok(())
    }
}
