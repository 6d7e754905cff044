// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gameplay graph for visual scripting (Blueprint-like).
//!
//! Execution flow uses `Exec` ports; exec inputs accept any number of
//! incoming connections so flows can merge.

use crate::node::{NodeCategory, NodeRegistry, NodeType};
use crate::port::{Port, PortType};
use crate::schema::GraphSchema;

/// Type ID of the entry point every gameplay graph needs
pub const EVENT_BEGIN_PLAY: &str = "event_begin_play";

fn exec_in(name: &str) -> Port {
    Port::input(name, PortType::Exec).with_multi_connect(true)
}

fn exec_out(name: &str) -> Port {
    Port::output(name, PortType::Exec)
}

/// Schema for gameplay graphs
pub fn gameplay_schema() -> GraphSchema {
    GraphSchema {
        name: "Gameplay".to_string(),
        required: vec![EVENT_BEGIN_PLAY.to_string()],
    }
}

/// Create the gameplay graph node registry
pub fn create_gameplay_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(
        NodeType::new(EVENT_BEGIN_PLAY, "Event Begin Play", NodeCategory::Input)
            .with_description("Triggered when gameplay starts")
            .with_output(exec_out("Exec")),
    );

    registry.register(
        NodeType::new("event_tick", "Event Tick", NodeCategory::Input)
            .with_description("Triggered every frame")
            .with_output(exec_out("Exec"))
            .with_output(Port::output("Delta Time", PortType::Float)),
    );

    registry.register(
        NodeType::new("branch", "Branch", NodeCategory::Logic)
            .with_description("If/else branching")
            .with_input(exec_in("Exec"))
            .with_input(Port::input("Condition", PortType::Bool))
            .with_output(exec_out("True"))
            .with_output(exec_out("False")),
    );

    registry.register(
        NodeType::new("print_string", "Print String", NodeCategory::Utility)
            .with_description("Print a string to the console")
            .with_input(exec_in("Exec"))
            .with_input(Port::input("String", PortType::String))
            .with_output(exec_out("Then")),
    );

    registry.register(
        NodeType::new("set_variable", "Set Variable", NodeCategory::Utility)
            .with_description("Store a value and pass it on")
            .with_input(exec_in("Exec"))
            .with_input(Port::input("Value", PortType::Any))
            .with_output(exec_out("Then"))
            .with_output(Port::output("Current", PortType::Any)),
    );

    registry
}
