//! Chat Integration - Socket Mode bot interface
//!
//! This crate provides the conversational interface for roomy:
//! - **Socket Mode** (`socket`) - WebSocket connection to the chat workspace
//! - **Slash Commands** (`commands`) - `/book`, `/book mine`, `/book all`
//! - **Events** (`events`) - Button interactions for date and slot pickers
//! - **Block Kit** (`blocks`) - Rich message builders (buttons, cards)
//! - **Booking Service** (`service`) - Engine-backed command/action handlers
//!
//! # Booking flow
//!
//! ```text
//! /book → date picker → date button → slot picker → slot button → ✅ / ❌
//! ```
//!
//! The engine owns validation and the reservation ledger; this crate only
//! renders its results and never mutates booking state itself.

pub mod blocks;
pub mod commands;
pub mod events;
pub mod service;
pub mod socket;
