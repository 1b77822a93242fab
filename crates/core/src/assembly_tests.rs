// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{provider_type, provider_user_assembly, user_type};

#[test]
fn add_instance_starts_at_initial_place() {
    let mut assembly = Assembly::new();
    assembly.add_instance("prov", provider_type()).unwrap();
    assert_eq!(assembly.active_place("prov").map(|p| p.as_str()), Some("off"));
}

#[test]
fn duplicate_instance_rejected() {
    let mut assembly = Assembly::new();
    assembly.add_instance("prov", provider_type()).unwrap();
    let err = assembly.add_instance("prov", provider_type()).unwrap_err();
    assert!(matches!(err, AssemblyError::DuplicateInstance { .. }));
}

#[test]
fn set_active_place_validates() {
    let mut assembly = Assembly::new();
    assembly.add_instance("prov", provider_type()).unwrap();
    assembly.set_active_place("prov", "on").unwrap();
    assert_eq!(assembly.active_place("prov").map(|p| p.as_str()), Some("on"));

    let err = assembly.set_active_place("prov", "nowhere").unwrap_err();
    assert!(matches!(err, AssemblyError::UnknownPlace { .. }));
    let err = assembly.set_active_place("ghost", "on").unwrap_err();
    assert!(matches!(err, AssemblyError::UnknownInstance { .. }));
}

#[test]
fn connect_is_symmetric() {
    let assembly = provider_user_assembly();

    let prov = assembly.instance("prov").unwrap();
    let provider_ends: Vec<_> = prov.connections("service").collect();
    assert_eq!(provider_ends, [&(ComponentId::new("user"), PortName::new("service"))]);

    let user = assembly.instance("user").unwrap();
    let user_ends: Vec<_> = user.connections("service").collect();
    assert_eq!(user_ends, [&(ComponentId::new("prov"), PortName::new("service"))]);
}

#[test]
fn external_port_connection_reverse_index() {
    let assembly = provider_user_assembly();
    let user = assembly.instance("user").unwrap();

    let local = user
        .external_port_connection(&ComponentId::new("prov"), &PortName::new("service"))
        .map(|p| p.as_str());
    assert_eq!(local, Some("service"));

    assert!(user
        .external_port_connection(&ComponentId::new("ghost"), &PortName::new("service"))
        .is_none());
}

#[test]
fn neighbors_span_all_ports() {
    let assembly = provider_user_assembly();
    let neighbors = assembly.instance("prov").unwrap().neighbors();
    assert_eq!(neighbors.len(), 1);
    assert!(neighbors.contains("user"));
}

#[test]
fn use_port_single_connection() {
    let mut assembly = provider_user_assembly();
    assembly.add_instance("prov2", provider_type()).unwrap();
    let err = assembly.connect("prov2", "service", "user", "service").unwrap_err();
    assert!(matches!(err, AssemblyError::UseAlreadyConnected { .. }));

    // The failed connect left no half-connection on prov2.
    let prov2 = assembly.instance("prov2").unwrap();
    assert_eq!(prov2.connections("service").count(), 0);
}

#[test]
fn provide_port_fans_out() {
    let mut assembly = Assembly::new();
    assembly.add_instance("prov", provider_type()).unwrap();
    assembly.add_instance("user1", user_type()).unwrap();
    assembly.add_instance("user2", user_type()).unwrap();
    assembly.connect("prov", "service", "user1", "service").unwrap();
    assembly.connect("prov", "service", "user2", "service").unwrap();

    let prov = assembly.instance("prov").unwrap();
    assert_eq!(prov.connections("service").count(), 2);
    assert_eq!(prov.neighbors().len(), 2);
}

#[test]
fn connect_direction_checked() {
    let mut assembly = Assembly::new();
    assembly.add_instance("prov", provider_type()).unwrap();
    assembly.add_instance("user", user_type()).unwrap();

    let err = assembly.connect("user", "service", "prov", "service").unwrap_err();
    assert!(matches!(err, AssemblyError::NotAProvidePort { .. }));
}

#[test]
fn connect_unknown_port_rejected() {
    let mut assembly = Assembly::new();
    assembly.add_instance("prov", provider_type()).unwrap();
    assembly.add_instance("user", user_type()).unwrap();

    let err = assembly.connect("prov", "nope", "user", "service").unwrap_err();
    assert!(matches!(err, AssemblyError::UnknownPort { .. }));
}

#[test]
fn disconnect_removes_both_ends() {
    let mut assembly = provider_user_assembly();
    assembly.disconnect("prov", "service", "user", "service").unwrap();

    assert_eq!(assembly.instance("prov").unwrap().connections("service").count(), 0);
    assert_eq!(assembly.instance("user").unwrap().connections("service").count(), 0);
    assert!(assembly
        .instance("user")
        .unwrap()
        .external_port_connection(&ComponentId::new("prov"), &PortName::new("service"))
        .is_none());
}

#[test]
fn connect_external_attaches_one_side() {
    let mut assembly = Assembly::new();
    assembly.add_instance("user", user_type()).unwrap();
    assembly.connect_external("user", "service", "prov", "service").unwrap();

    let user = assembly.instance("user").unwrap();
    assert_eq!(user.connections("service").count(), 1);
    assert_eq!(
        user.external_port_connection(&ComponentId::new("prov"), &PortName::new("service"))
            .map(|p| p.as_str()),
        Some("service"),
    );
    assert!(assembly.instance("prov").is_none());
}

#[test]
fn skeleton_reflects_structure() {
    let assembly = provider_user_assembly();
    let skeleton = assembly.skeleton();

    assert_eq!(skeleton.components.len(), 2);
    assert_eq!(skeleton.components.get("prov").map(|t| t.as_str()), Some("provider"));
    assert!(skeleton
        .connections
        .contains(&ConnectionEnds::new("prov", "service", "user", "service")));
}
