// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ transport implementations
//!
//! A load-balancing task queue built on **ROUTER** (coordinator) ↔ **DEALER**
//! (workers), with worker readiness and heartbeat signals.
//!
//! ## Feature Flags
//!
//! - `zmq-server`: Enable the coordinator-side ROUTER queue
//! - `zmq-client`: Enable the worker-side DEALER endpoint
//! - `zmq`: Enable both client and server
//!
//! ## Example (Coordinator)
//!
//! ```no_run
//! use arbor_transports::zmq::server::ZmqTaskRouter;
//! use arbor_transports::traits::{TaskQueueServer, Transport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = ZmqTaskRouter::with_address("tcp://*:5557")?;
//! router.start()?;
//!
//! router.dispatch(b"task frame")?;
//! let reply = router.collect_timeout(3000)?;
//! println!("Reply: {:?}", reply);
//! # Ok(())
//! # }
//! ```
//!
//! ## Example (Worker)
//!
//! ```no_run
//! use arbor_transports::zmq::client::ZmqTaskDealer;
//! use arbor_transports::traits::{TaskQueueClient, Transport};
//!
//! let mut worker = ZmqTaskDealer::with_address("tcp://localhost:5557")?;
//! worker.start()?; // announces READY
//!
//! let task = worker.fetch_timeout(1000)?;
//! worker.reply(&task)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "zmq-server")]
pub mod server;

#[cfg(feature = "zmq-client")]
pub mod client;

#[cfg(feature = "zmq-server")]
pub use server::ZmqTaskRouter;

#[cfg(feature = "zmq-client")]
pub use client::ZmqTaskDealer;
