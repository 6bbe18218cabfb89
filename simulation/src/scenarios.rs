//! Pre-defined scenarios for the replicated log
//!
//! Scripted walkthroughs print each command and its output; the chaos run
//! drives random operations with message loss, duplication and reordering.

use std::collections::{BTreeMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use replog_core::{EventKind, ReplicaId, ReplicatedSystem};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::{ChaosError, CommandError};
use crate::session::Session;

/// Run `lines` against `session`, echoing each command and its output.
fn play(session: &Session, lines: &[&str]) -> Result<(), CommandError> {
    for line in lines {
        println!("> {line}");
        if let Some(output) = session.execute_line(line)? {
            println!("{output}");
        }
    }
    Ok(())
}

/// Run the canonical three-replica walkthrough:
///
/// ```text
/// Increment(1, "X")          replica 1 has X = 1
/// GetValue(1, "X")           1
/// GetValue(2, "X")           null
/// SendLog(1, 2)              Transmission number: 1
/// Increment(1, "Y")          happens after the send, so it is not included
/// ReceiveLog(1)              replica 2 now has X = 1 but no Y
/// ```
pub fn run_canonical_scenario() -> Result<ReplicatedSystem, CommandError> {
    info!("=== Running Canonical Scenario ===");
    let session = Session::new(3)?;

    println!("\n--- Step 1: Replica 1 increments X ---");
    play(
        &session,
        &[
            "Increment(1, \"X\")",
            "GetValue(1, \"X\")",
            "GetValue(2, \"X\")",
            "PrintState(1)",
        ],
    )?;

    println!("\n--- Step 2: Replica 1 sends to 2, then increments Y ---");
    play(
        &session,
        &["SendLog(1, 2)", "Increment(1, \"Y\")", "PrintState(2)"],
    )?;

    println!("\n--- Step 3: Replica 2 receives transmission 1 ---");
    play(
        &session,
        &["ReceiveLog(1)", "PrintState(2)", "GetValue(2, \"X\")", "GetValue(2, \"Y\")"],
    )?;

    Ok(session.into_system())
}

/// Run a relay: replica 1's increment reaches 3 only through 2.
///
/// 3 then replies to 1, after which 1 knows 3 has its event and has nothing
/// left to send there.
pub fn run_relay_scenario() -> Result<ReplicatedSystem, CommandError> {
    info!("=== Running Relay Scenario ===");
    let session = Session::new(3)?;

    println!("\n--- Step 1: 1 -> 2 ---");
    play(
        &session,
        &["Increment(1, \"X\")", "SendLog(1, 2)", "ReceiveLog(1)"],
    )?;

    println!("\n--- Step 2: 2 -> 3 carries 1's event ---");
    play(
        &session,
        &["SendLog(2, 3)", "ReceiveLog(2)", "GetValue(3, \"X\")", "PrintState(3)"],
    )?;

    println!("\n--- Step 3: 3 -> 1 tells 1 what 3 knows ---");
    play(
        &session,
        &["SendLog(3, 1)", "ReceiveLog(3)", "PrintState(1)"],
    )?;

    let pending = session
        .system()
        .inspect(ReplicaId::new(1), |replica| {
            replica.build_transmission(ReplicaId::new(3))
        })??;
    println!("  1 -> 3 would now carry {} events", pending.events().len());

    Ok(session.into_system())
}

/// Show the double-apply hazard: the same increment reaches replica 3
/// directly from 1 and relayed through 2, and is applied twice.
pub fn run_duplicate_hazard_scenario() -> Result<ReplicatedSystem, CommandError> {
    info!("=== Running Duplicate Hazard Scenario ===");
    let session = Session::new(3)?;

    println!("\n--- Step 1: 1 increments X and sends to both 2 and 3 ---");
    play(
        &session,
        &["Increment(1, \"X\")", "SendLog(1, 2)", "SendLog(1, 3)"],
    )?;

    println!("\n--- Step 2: 2 receives and forwards to 3 before 3 hears from 1 ---");
    play(
        &session,
        &["ReceiveLog(1)", "SendLog(2, 3)", "ReceiveLog(3)"],
    )?;

    println!("\n--- Step 3: 1's direct transmission finally arrives ---");
    play(
        &session,
        &["ReceiveLog(2)", "GetValue(3, \"X\")", "PrintState(3)"],
    )?;

    println!("  Replica 3 applied the same increment twice");
    Ok(session.into_system())
}

/// Counters and final state of a chaos run
#[derive(Debug, Clone, Serialize)]
pub struct ChaosReport {
    pub seed: u64,
    pub replica_count: usize,
    pub operations: u64,
    pub local_ops: u64,
    pub sends: u64,
    pub deliveries: u64,
    pub drops: u64,
    pub duplicates: u64,
    /// Transmissions still pending when the random phase ended
    pub pending_before_flush: usize,
    /// Log entries applied more than once, summed over replicas
    pub double_applied: usize,
    pub log_lengths: BTreeMap<ReplicaId, usize>,
    pub final_values: BTreeMap<ReplicaId, BTreeMap<String, i64>>,
    /// Whether every replica ended with the same values
    pub converged: bool,
}

/// Run random operations with loss, duplication and reordering, then
/// deliver everything left and flush with two rounds of all-pairs exchange.
pub fn run_chaos(config: &SimConfig) -> Result<ChaosReport, ChaosError> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    info!(
        seed,
        replicas = config.replica_count,
        operations = config.operations,
        "=== Running Chaos Scenario ==="
    );

    let system = ReplicatedSystem::new(config.replica_count)?;
    let ids: Vec<ReplicaId> = system.replica_ids().collect();

    let mut report = ChaosReport {
        seed,
        replica_count: config.replica_count,
        operations: config.operations,
        local_ops: 0,
        sends: 0,
        deliveries: 0,
        drops: 0,
        duplicates: 0,
        pending_before_flush: 0,
        double_applied: 0,
        log_lengths: BTreeMap::new(),
        final_values: BTreeMap::new(),
        converged: false,
    };

    for step in 0..config.operations {
        let roll: f64 = rng.random();

        if roll < config.send_probability {
            let source = ids[rng.random_range(0..ids.len())];
            let destination = ids[rng.random_range(0..ids.len())];
            system.send(source, destination)?;
            report.sends += 1;
        } else if roll < config.send_probability + config.deliver_probability {
            let pending = system.pending_transmissions();
            if pending.is_empty() {
                continue;
            }
            // Picking at random reorders delivery
            let id = pending[rng.random_range(0..pending.len())];
            if rng.random_bool(config.drop_probability) {
                system.drop_transmission(id)?;
                report.drops += 1;
                continue;
            }
            if rng.random_bool(config.duplicate_probability) {
                system.duplicate_transmission(id)?;
                report.duplicates += 1;
            }
            system.deliver(id)?;
            report.deliveries += 1;
        } else {
            let replica = ids[rng.random_range(0..ids.len())];
            let kind = if rng.random_bool(config.increment_probability) {
                EventKind::Increment
            } else {
                EventKind::Decrement
            };
            let key = format!("K{}", rng.random_range(0..config.key_space));
            system.local_op(replica, kind, &key)?;
            report.local_ops += 1;
        }

        if step % 50 == 0 {
            debug!(step, pending = system.pending_transmissions().len(), "Chaos progress");
        }
    }

    report.pending_before_flush = system.pending_transmissions().len();
    for id in system.pending_transmissions() {
        system.deliver(id)?;
        report.deliveries += 1;
    }

    for _round in 0..2 {
        for &source in &ids {
            for &destination in &ids {
                if source == destination {
                    continue;
                }
                let id = system.send(source, destination)?;
                system.deliver(id)?;
                report.sends += 1;
                report.deliveries += 1;
            }
        }
    }

    for &id in &ids {
        let state = system.dump_state(id)?;
        let mut seen = HashSet::new();
        report.double_applied += state
            .log
            .iter()
            .filter(|entry| !seen.insert((entry.origin, entry.origin_seq)))
            .count();
        report.log_lengths.insert(id, state.log.len());
        report.final_values.insert(id, state.values);
    }

    let mut values = report.final_values.values();
    let first = values.next();
    report.converged = values.all(|v| Some(v) == first);

    info!(converged = report.converged, "Chaos run finished");
    Ok(report)
}

/// Print a chaos report in the console layout.
pub fn print_chaos_report(report: &ChaosReport) {
    println!("\n=== Final Statistics ===");
    println!("  Seed: {}", report.seed);
    println!("  Replicas: {}", report.replica_count);
    println!("  Steps: {}", report.operations);
    println!("  Local operations: {}", report.local_ops);
    println!("  Transmissions sent: {}", report.sends);
    println!("  Transmissions delivered: {}", report.deliveries);
    println!("  Transmissions dropped: {}", report.drops);
    println!("  Transmissions duplicated: {}", report.duplicates);
    println!("  Pending before flush: {}", report.pending_before_flush);
    println!("  Double-applied log entries: {}", report.double_applied);
    for (id, values) in &report.final_values {
        let log_len = report.log_lengths.get(id).copied().unwrap_or_default();
        println!("  Replica {id} (log {log_len}): {values:?}");
    }
    println!("  Converged: {}", report.converged);
}
