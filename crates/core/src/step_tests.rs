// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn container_returns_none_for_network_steps() {
    assert_eq!(Step::CreateNetwork.container(), None);
    assert_eq!(Step::DeleteNetwork.container(), None);
}

#[test]
fn container_returns_target_for_container_steps() {
    let step = Step::StartContainer { container: "web".into() };
    assert_eq!(step.container(), Some("web"));
}

#[test]
fn display_includes_the_variant_name_and_container() {
    assert_eq!(Step::BuildImage { container: "web".into() }.to_string(), "BuildImage(container: 'web')");
    assert_eq!(Step::CreateNetwork.to_string(), "CreateNetwork");
    assert_eq!(Step::RunContainer { container: "web".into() }.to_string(), "RunContainer(container: 'web')");
}
