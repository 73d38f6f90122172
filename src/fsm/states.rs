//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers with no closures
//! or heap.
//!
//! ```text
//!  IDLE ──[now < hold_expiry]──▶ HOLDING
//!    ▲                              │
//!    └──────[now >= hold_expiry]────┘
//! ```
//!
//! `Holding` keeps the servo attached and re-writes the target angle on
//! every tick.  `Idle` keeps it detached and clears stale hold deadlines.

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1 — Holding
        StateDescriptor {
            id: StateId::Holding,
            name: "Holding",
            on_enter: Some(holding_enter),
            on_exit: Some(holding_exit),
            on_update: holding_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.commands.attached = false;
    debug!("IDLE: servo released");
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.is_holding() {
        return Some(StateId::Holding);
    }

    // A zero or negative hold lands here already expired.
    if ctx.actuation.hold_expiry.take().is_some() {
        debug!("IDLE: discarded hold that expired on arrival");
    }
    ctx.commands.attached = false;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HOLDING state — servo powered at desired_angle until the deadline
// ═══════════════════════════════════════════════════════════════════════════

fn holding_enter(ctx: &mut FsmContext) {
    ctx.commands.attached = true;
    ctx.commands.angle = ctx.actuation.desired_angle;
    info!(
        "HOLDING: {}° until t={}ms",
        ctx.actuation.desired_angle,
        ctx.actuation.hold_expiry.unwrap_or(ctx.now)
    );
}

fn holding_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.is_holding() {
        return Some(StateId::Idle);
    }
    ctx.commands.attached = true;
    ctx.commands.angle = ctx.actuation.desired_angle;
    None
}

fn holding_exit(ctx: &mut FsmContext) {
    ctx.actuation.hold_expiry = None;
    info!("HOLDING: window closed at t={}ms", ctx.now);
}
