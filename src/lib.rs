//! # SimpleDough
//!
//! Back office for a donut shop: orders move through their lifecycle,
//! cancelled orders hand their stock back to the inventory, and the admin
//! dashboard summarizes the day.
//!
//! Stateful parts run as actors, each owning its state behind a mailbox:
//!
//! - the inventory is a generic [`actor_framework::ResourceActor`] keyed by
//!   product id, driven through [`clients::InventoryClient`];
//! - the order collection is owned by [`lifecycle::OrderService`], driven
//!   through [`clients::OrderClient`] and persisted through a
//!   [`repository::OrderRepository`];
//! - [`session::SessionManager`] tracks the signed-in user.
//!
//! [`app_system::ShopSystem`] starts and wires them.

pub mod actor_framework;
pub mod app_system;
pub mod backend;
pub mod clients;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod inventory;
pub mod lifecycle;
pub mod listing;
pub mod messages;
pub mod repository;
pub mod session;

#[cfg(test)]
mod mock_framework;
