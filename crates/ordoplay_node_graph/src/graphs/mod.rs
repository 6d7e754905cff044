// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preset graph kinds built on the core framework.

pub mod gameplay;
