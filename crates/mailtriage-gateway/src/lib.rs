// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP control surface for the mailtriage worker.
//!
//! Exposes start/stop controls and a dashboard snapshot over JSON. The
//! gateway only reads worker snapshots; all state changes go through the
//! [`WorkerSupervisor`](mailtriage_agent::WorkerSupervisor).

pub mod handlers;
pub mod server;

pub use server::{GatewayState, router, start_server};
