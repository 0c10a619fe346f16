//! Node lifecycle integration tests
//!
//! Drives the controller and device nodes through the node server with a
//! simulated GPIO backend

use std::sync::Arc;
use std::time::Duration;

use gpio_nodeserver::nodes::{
    CommandMessage, ControllerNode, DeviceDescriptor, DriverReporter, DriverState, NodeContext,
    OutputSettings, default_catalog,
};
use gpio_nodeserver::{Error, HostInterface, Level, NodeServer, SimulatedGpio};
use tokio::sync::mpsc;

mod common;
use common::{FlakyHost, config_with, server_with, st_of};

#[tokio::test]
async fn test_catalog_creates_yard_audio_off() {
    let (server, _gpio) = server_with(vec![DeviceDescriptor::new("Yard Audio", 29)]);
    assert!(server.host().addresses().await.is_empty());

    let report = server.create_catalog().await;
    assert_eq!(report.created, vec!["gpio_29"]);
    assert_eq!(server.host().addresses().await, vec!["gpio_29"]);
    assert_eq!(st_of(&server, "gpio_29").await, "0");

    server
        .dispatch("gpio_29", &CommandMessage::new("DON"))
        .await
        .unwrap();
    assert_eq!(st_of(&server, "gpio_29").await, "1");
}

#[tokio::test]
async fn test_catalog_creation_is_idempotent() {
    let (server, _gpio) = server_with(default_catalog());

    let first = server.create_catalog().await;
    let after_first = server.host().addresses().await;
    assert_eq!(first.created.len(), 5);

    let second = server.create_catalog().await;
    assert!(second.created.is_empty());
    assert_eq!(second.skipped.len(), 5);
    assert_eq!(server.host().addresses().await, after_first);
}

#[tokio::test]
async fn test_catalog_order_is_preserved() {
    let (server, _gpio) = server_with(default_catalog());
    let report = server.create_catalog().await;
    assert_eq!(
        report.created,
        vec!["gpio_29", "gpio_37", "gpio_36", "gpio_35", "gpio_40"]
    );
}

#[tokio::test]
async fn test_registration_failure_does_not_abort_catalog() {
    let host = Arc::new(FlakyHost::refusing(&["gpio_37"]));
    let (reporter, _rx) = DriverReporter::channel();
    let context = NodeContext {
        gpio: Arc::new(SimulatedGpio::new()),
        reporter,
        output: OutputSettings::default(),
    };
    let controller = ControllerNode::new(
        Arc::clone(&host) as Arc<dyn HostInterface>,
        context,
        default_catalog(),
        "controller",
        "GPIO Controller",
    );

    let report = controller.create_catalog().await;
    assert_eq!(report.created.len(), 4);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "gpio_37");
    assert!(!host.addresses().await.contains(&"gpio_37".to_string()));

    // The missing entry is picked up by the next pass
    host.allow_all().await;
    let retry = controller.create_catalog().await;
    assert_eq!(retry.created, vec!["gpio_37"]);
    assert_eq!(retry.skipped.len(), 4);
    assert_eq!(host.addresses().await.len(), 5);
}

#[tokio::test]
async fn test_node_limit_leaves_entries_absent() {
    let mut config = config_with(default_catalog());
    config.nodes.max_nodes = 2;
    let server = NodeServer::with_gpio(config, Arc::new(SimulatedGpio::new()));

    let report = server.create_catalog().await;
    assert_eq!(report.created, vec!["gpio_29", "gpio_37"]);
    assert_eq!(report.failed.len(), 3);
}

#[tokio::test]
async fn test_on_off_transitions_and_query() {
    let (mut server, gpio) = server_with(vec![DeviceDescriptor::new("Path Lights", 37)]);
    let mut reports = server.take_reports().unwrap();
    server.create_catalog().await;

    for _ in 0..2 {
        server
            .dispatch("gpio_37", &CommandMessage::new("DON"))
            .await
            .unwrap();
        assert_eq!(gpio.level(37).await, Some(Level::Low));
        server
            .dispatch("gpio_37", &CommandMessage::new("DOF"))
            .await
            .unwrap();
        assert_eq!(gpio.level(37).await, Some(Level::High));
    }

    // Drain the transition reports, then query re-reports the last value
    while reports.try_recv().is_ok() {}
    server
        .dispatch("gpio_37", &CommandMessage::new("QUERY"))
        .await
        .unwrap();
    let report = reports.try_recv().unwrap();
    assert_eq!(report.address, "gpio_37");
    assert_eq!(report.value, "0");
    assert_eq!(report.uom.code(), 2);
}

#[tokio::test]
async fn test_activate_without_value_uses_on_value() {
    let mut config = config_with(vec![DeviceDescriptor::new("Bench Lights", 35)]);
    config.nodes.on_value = "100".to_string();
    let server = NodeServer::with_gpio(config, Arc::new(SimulatedGpio::new()));
    server.create_catalog().await;

    server
        .dispatch("gpio_35", &CommandMessage::new("DON").with_value(""))
        .await
        .unwrap();
    assert_eq!(st_of(&server, "gpio_35").await, "100");

    let node = server.host().node("gpio_35").await.unwrap();
    assert_eq!(node.lock().await.state(), DriverState::On);
}

#[tokio::test]
async fn test_failed_write_is_surfaced_and_state_stays_stale() {
    let (server, gpio) = server_with(vec![DeviceDescriptor::new("Shed Lights", 36)]);
    server.create_catalog().await;
    gpio.fail_pin(36).await;

    let err = server
        .dispatch("gpio_36", &CommandMessage::new("DON"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::GpioWrite { pin: 36, .. }));
    assert_eq!(st_of(&server, "gpio_36").await, "0");

    gpio.restore_pin(36).await;
    server
        .dispatch("gpio_36", &CommandMessage::new("DON"))
        .await
        .unwrap();
    assert_eq!(st_of(&server, "gpio_36").await, "1");
}

#[tokio::test]
async fn test_setup_failure_still_registers_node() {
    let (server, gpio) = server_with(vec![DeviceDescriptor::new("Yard Audio", 29)]);
    gpio.fail_pin(29).await;

    let report = server.create_catalog().await;
    assert_eq!(report.created, vec!["gpio_29"]);

    gpio.restore_pin(29).await;
    // The pin was never configured, so the write is refused
    let err = server
        .dispatch("gpio_29", &CommandMessage::new("DON"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::GpioWrite { .. }));
    assert_eq!(st_of(&server, "gpio_29").await, "0");
}

#[tokio::test]
async fn test_commands_to_one_node_are_serialized() {
    let gpio = Arc::new(SimulatedGpio::new().with_latency(Duration::from_millis(20)));
    let server = Arc::new(NodeServer::with_gpio(
        config_with(vec![DeviceDescriptor::new("Yard Audio", 29)]),
        gpio.clone(),
    ));
    server.create_catalog().await;

    let on = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .dispatch("gpio_29", &CommandMessage::new("DON"))
                .await
        })
    };
    let off = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .dispatch("gpio_29", &CommandMessage::new("DOF"))
                .await
        })
    };
    on.await.unwrap().unwrap();
    off.await.unwrap().unwrap();

    // Whichever ran last owns both the pin level and the reported state
    let writes = gpio.writes().await;
    assert_eq!(writes.len(), 2);
    let last = writes.last().unwrap().level;
    let expected = if last == Level::Low { "1" } else { "0" };
    assert_eq!(st_of(&server, "gpio_29").await, expected);
    assert_eq!(gpio.level(29).await, Some(last));
}

#[tokio::test]
async fn test_overlapping_catalog_passes_do_not_reset_pins() {
    let gpio = Arc::new(SimulatedGpio::new().with_setup_latency(Duration::from_millis(100)));
    let server = Arc::new(NodeServer::with_gpio(
        config_with(vec![DeviceDescriptor::new("Yard Audio", 29)]),
        gpio.clone(),
    ));

    let first = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .dispatch("controller", &CommandMessage::new("CREATE_NEW"))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .dispatch("controller", &CommandMessage::new("CREATE_NEW"))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(130)).await;
    server
        .dispatch("gpio_29", &CommandMessage::new("DON"))
        .await
        .unwrap();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // The second pass sees the node and leaves its pin alone
    assert_eq!(gpio.setups().await, vec![29]);
    assert_eq!(gpio.level(29).await, Some(Level::Low));
    assert_eq!(st_of(&server, "gpio_29").await, "1");
}

#[tokio::test]
async fn test_unknown_address_and_command() {
    let (server, _gpio) = server_with(vec![DeviceDescriptor::new("Yard Audio", 29)]);
    server.create_catalog().await;

    let err = server
        .dispatch("gpio_31", &CommandMessage::new("DON"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(_)));

    let err = server
        .dispatch("gpio_29", &CommandMessage::new("DIM"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownCommand { .. }));
}

#[tokio::test]
async fn test_controller_commands_through_dispatch() {
    let (server, _gpio) = server_with(default_catalog());
    server.host().add_notice("relay board offline").await;

    for command in ["CREATE_NEW", "DISCOVER", "UPDATE_PROFILE", "REMOVE_NOTICES", "QUERY"] {
        server
            .dispatch("controller", &CommandMessage::new(command))
            .await
            .unwrap();
    }

    assert_eq!(server.host().addresses().await.len(), 5);
    assert_eq!(server.host().profile_pushes(), 1);
    assert!(server.host().notices().await.is_empty());
}

#[tokio::test]
async fn test_query_all_reports_every_node() {
    let (mut server, _gpio) = server_with(default_catalog());
    let mut reports = server.take_reports().unwrap();
    server.create_catalog().await;

    server.query_all().await;

    let mut addresses = Vec::new();
    while let Ok(report) = reports.try_recv() {
        addresses.push(report.address);
    }
    assert_eq!(addresses.len(), 6);
    assert_eq!(addresses[0], "controller");
}

#[tokio::test]
async fn test_serve_dispatches_lines() {
    let (server, _gpio) = server_with(default_catalog());
    let (tx, rx) = mpsc::channel(16);

    for line in [
        "controller CREATE_NEW",
        "# yard on",
        "gpio_29 DON",
        "gpio_40 don 100",
        "gpio_99 DON",
        "garbage",
    ] {
        tx.send(line.to_string()).await.unwrap();
    }
    drop(tx);

    let handled = server.serve(rx).await;
    assert_eq!(handled, 3);
    assert_eq!(st_of(&server, "gpio_29").await, "1");
    assert_eq!(st_of(&server, "gpio_40").await, "100");
    assert_eq!(st_of(&server, "gpio_37").await, "0");
}
