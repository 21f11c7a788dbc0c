//! Prompt Fusion Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Prompt Fusion
//! parser and scheduler. It includes:
//!
//! - **Expressions**: The immutable prompt expression tree ([`expression::Expression`])
//! - **Curves**: Named keyframe blend curves ([`curve::Curve`])
//! - **Schedules**: Step-range to literal-prompt mappings ([`schedule::Schedule`])

pub mod curve;
pub mod expression;
pub mod schedule;
