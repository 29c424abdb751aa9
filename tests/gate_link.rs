use ambulance_gate::{
    bridge, Controller, DetectionFilter, RecordingServo, RunStats, Transport, Trigger,
};
use tokio::io::{duplex, BufReader};
use tokio::time::Duration;

#[tokio::test(start_paused = true)]
async fn detector_feed_raises_gate() {
    let (detector_end, gate_end) = duplex(64);

    let servo = RecordingServo::new();
    let history = servo.history();
    let mut controller = Controller::new(servo.clone()).unwrap();
    let gate = tokio::spawn(async move {
        controller
            .run(Transport::new(gate_end), std::future::pending())
            .await
    });

    let feed = concat!(
        "[{\"label\":\"bus\",\"confidence\":0.95}]\n",
        "[{\"label\":\"ambulance\",\"confidence\":0.92}]\n",
    );
    let mut trigger = Trigger::new(Transport::new(detector_end));
    let stats = bridge(
        BufReader::new(feed.as_bytes()),
        &DetectionFilter::default(),
        &mut trigger,
        std::future::pending(),
    )
    .await
    .unwrap();
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.signals, 1);

    // Hanging up the detector closes the line and stops the gate.
    drop(trigger);
    let run = gate.await.unwrap().unwrap();

    assert_eq!(
        run,
        RunStats {
            bytes: 1,
            sweeps: 1,
            ignored: 0
        }
    );
    assert_eq!(servo.angles(), vec![0, 90, 0]);

    let history = history.lock();
    assert_eq!(history[2].0 - history[1].0, Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn noise_on_the_line_never_moves_servo() {
    let (mut remote, gate_end) = duplex(256);
    tokio::io::AsyncWriteExt::write_all(&mut remote, b"hello\r\nabc\x00\xff")
        .await
        .unwrap();
    drop(remote);

    let servo = RecordingServo::new();
    let mut controller = Controller::new(servo.clone()).unwrap();
    let run = controller
        .run(Transport::new(gate_end), std::future::pending())
        .await
        .unwrap();

    assert_eq!(run.sweeps, 0);
    assert_eq!(run.ignored, 12);
    assert_eq!(servo.angles(), vec![0]);
}
