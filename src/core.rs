use crate::engine::cycle::Component;
use crate::func_unit::Pool;
use crate::scheduler::{IssueRequest, Reservation, Scheduler, StuckInstruction};
use crate::{config, op::OperationClass, Cycle};
use console::style;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

/// A result leaving a functional unit, handed to writeback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Completion {
    /// Instruction identifier from the issue request.
    pub instruction: u64,
    pub op: OperationClass,
    /// The functional unit replica that serviced the instruction.
    pub unit: usize,
    /// The cycle the result becomes available.
    pub cycle: Cycle,
}

impl std::fmt::Display for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[id={}] done on fu[{:03}] at cycle {}",
            self.op, self.instruction, self.unit, self.cycle
        )
    }
}

/// Writeback collaborator fed by the completion tracker.
pub trait WritebackPort {
    fn result_ready(&mut self, completion: Completion);
}

impl WritebackPort for Vec<Completion> {
    fn result_ready(&mut self, completion: Completion) {
        self.push(completion);
    }
}

impl WritebackPort for VecDeque<Completion> {
    fn result_ready(&mut self, completion: Completion) {
        self.push_back(completion);
    }
}

/// In-flight reservation, ordered by completion cycle, then issue order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct InFlight {
    completes_at: Cycle,
    issue_order: u64,
    instruction: u64,
    op: OperationClass,
    unit: usize,
}

impl From<Reservation> for InFlight {
    fn from(reservation: Reservation) -> Self {
        Self {
            completes_at: reservation.completes_at,
            issue_order: reservation.issue_order,
            instruction: reservation.request.id,
            op: reservation.request.op,
            unit: reservation.unit,
        }
    }
}

/// The issue core: functional unit pool, issue scheduler, and completion
/// tracking behind one clock.
///
/// Per cycle, strictly in this order: expired busy windows are released, the
/// issue pass runs, and completions due this cycle go out to the writeback
/// port. A reservation can therefore never complete in the cycle it was
/// created, and a unit freed this cycle can be reused this cycle.
pub struct Core<W> {
    pub pool: Pool,
    pub scheduler: Scheduler,
    pub result_port: W,
    in_flight: BinaryHeap<Reverse<InFlight>>,
    stuck: Vec<StuckInstruction>,
    clock: Cycle,
    stats: stats::Stats,
}

impl<W> std::fmt::Debug for Core<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("clock", &self.clock)
            .field("pending", &self.scheduler.num_pending())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl<W: WritebackPort> Core<W> {
    pub fn new(machine: &config::Machine, result_port: W) -> Result<Self, config::Error> {
        let pool = Pool::new(machine)?;
        log::debug!("core: {}", pool);
        Ok(Self {
            pool,
            scheduler: Scheduler::new(),
            result_port,
            in_flight: BinaryHeap::new(),
            stuck: Vec::new(),
            clock: 0,
            stats: stats::Stats::default(),
        })
    }

    /// The cycle a request submitted now would first be considered in.
    #[must_use]
    pub fn current_cycle(&self) -> Cycle {
        self.clock
    }

    /// Hands a ready instruction to the issue scheduler.
    pub fn submit(&mut self, request: IssueRequest) {
        self.scheduler.submit(request);
    }

    /// Runs one cycle and advances the clock.
    pub fn tick(&mut self) {
        let cycle = self.clock;
        self.cycle(cycle);
        self.clock += 1;
    }

    /// True when nothing is pending and nothing is in flight.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.scheduler.is_drained() && self.in_flight.is_empty()
    }

    /// Ticks until the pending set and every in-flight reservation drain.
    ///
    /// Terminates for every machine: requests that can never issue are
    /// removed by the scheduler as stuck, and everything else eventually
    /// finds a freed unit.
    pub fn run_to_completion(&mut self) {
        while !self.is_drained() {
            self.tick();
        }
    }

    /// Requests that could never issue on this machine.
    #[must_use]
    pub fn stuck_instructions(&self) -> &[StuckInstruction] {
        &self.stuck
    }

    #[must_use]
    pub fn stats(&self) -> stats::Stats {
        let mut stats = self.stats.clone();
        stats.scheduler += self.scheduler.stats.clone();
        stats
    }
}

impl<W: WritebackPort> Component for Core<W> {
    fn cycle(&mut self, cycle: u64) {
        log::debug!(
            "{} pending={} in_flight={}",
            style(format!("cycle {cycle:03} core:")).red(),
            self.scheduler.num_pending(),
            self.in_flight.len(),
        );

        self.pool.release_expired(cycle);

        let outcome = self.scheduler.issue(&mut self.pool, cycle);
        for reservation in outcome.reservations {
            debug_assert!(reservation.completes_at > cycle);
            self.stats.instructions.inc(reservation.request.op.as_str());
            self.in_flight.push(Reverse(InFlight::from(reservation)));
        }
        self.stuck.extend(outcome.stuck);

        while self
            .in_flight
            .peek()
            .is_some_and(|Reverse(head)| head.completes_at <= cycle)
        {
            let Reverse(done) = self.in_flight.pop().unwrap();
            debug_assert_eq!(done.completes_at, cycle);
            log::debug!(
                "{} {}[id={}] completes on fu[{:03}]",
                style(format!("cycle {cycle:03} writeback:")).red(),
                done.op,
                done.instruction,
                done.unit,
            );
            self.stats.sim.completions += 1;
            self.result_port.result_ready(Completion {
                instruction: done.instruction,
                op: done.op,
                unit: done.unit,
                cycle: done.completes_at,
            });
        }

        self.stats.sim.cycles += 1;
    }
}
