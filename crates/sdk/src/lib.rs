//! rbank lending protocol SDK.
//!
//! # Overview
//!
//! Typed handles of the rbank smart contracts: [`Controller`] keeps the
//! registry of markets and evaluates account solvency, every [`Market`] pools
//! a single ERC20 [`Token`] accounts supply to and borrow from.
//!
//! Start with [`client::connect`] to get a chain client, then bind the
//! deployed controller with [`Rbank::new`] to reach the registered markets.
//!
//! Besides forwarding calls, the SDK computes:
//!
//! * [`health::normalize`] - account health as a `[0, 1]` score.
//!
//! * [`history`] - balance time series approximated by sampling past blocks,
//!   see [`Controller::overall_balance`] and [`Market::history`].
//!
//! [`stream::events`] provides continuous stream of decoded contract events.
//!
//! # Limitations/follow-ups
//!
//! * Transactions are sent from accounts managed by the node, local signers
//!   are not supported.
//!
//! * The number of blocks per year used for history sampling is an
//!   approximation, actual block times vary.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `testing` | yes | Enables [`testing`] module. |

pub mod abi;
pub mod client;
pub mod controller;
pub mod error;
pub mod health;
pub mod history;
pub mod market;
pub mod num;
pub mod rbank;
pub mod stream;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod token;
pub mod types;

pub use controller::Controller;
pub use market::Market;
pub use rbank::Rbank;
pub use token::Token;
