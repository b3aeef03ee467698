use super::*;

#[test]
fn constructors_set_kind() {
    assert!(Notification::success("ok").is_success());
    assert!(!Notification::failure("nope").is_success());
    assert_eq!(Notification::failure("nope").message, "nope");
}

#[test]
fn channel_notifier_delivers_in_order() {
    let (notifier, mut rx) = ChannelNotifier::channel();
    notifier.notify(Notification::success("first"));
    notifier.notify(Notification::failure("second"));

    assert_eq!(rx.try_recv().unwrap(), Notification::success("first"));
    assert_eq!(rx.try_recv().unwrap(), Notification::failure("second"));
    assert!(rx.try_recv().is_err());
}

#[test]
fn channel_notifier_tolerates_closed_receiver() {
    let (notifier, rx) = ChannelNotifier::channel();
    drop(rx);
    notifier.notify(Notification::success("nobody listening"));
}

#[test]
fn tracing_notifier_accepts_both_kinds() {
    TracingNotifier.notify(Notification::success("ok"));
    TracingNotifier.notify(Notification::failure("nope"));
}
