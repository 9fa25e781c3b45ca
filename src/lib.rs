//! stream-alert - a VK bot that notifies subscribers when creators go live.
//!
//! This crate provides:
//! - Live detection on Twitch, YouTube, Kick, VK Play Live, Telegram
//!   channels and VK community walls
//! - Edge-triggered notifications backed by a SQLite state store
//! - Subscription management through a VK community chat bot

pub mod bot;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod logging;
pub mod messenger;
pub mod platform;
pub mod repository;
pub mod service;
pub mod subscriber;
pub mod task;
pub mod template;
