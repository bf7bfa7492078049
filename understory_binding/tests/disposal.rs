// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subscription lifetime across binding kinds.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_binding::{
    Accessor, Binding, BindingError, DataContext, Notifier, Observable, ObservableValue,
    OneWayBinding, Sink, TwoWayBinding,
};

struct Settings {
    volume: Cell<f64>,
    notifier: Notifier,
}

impl Observable for Settings {
    fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

const VOLUME: Accessor<Settings, f64> = Accessor::read_write(
    "Volume",
    |s| s.volume.get(),
    |s, v| {
        s.volume.set(v);
        s.notifier.notify("Volume");
    },
);

fn settings(volume: f64) -> Rc<Settings> {
    Rc::new(Settings {
        volume: Cell::new(volume),
        notifier: Notifier::new(),
    })
}

fn ignore<T: 'static>() -> Sink<T> {
    Rc::new(|_: Result<T, BindingError>| {})
}

#[test]
fn double_dispose_releases_once() {
    let source = settings(0.5);
    let mut binding: OneWayBinding<Settings, f64, f64> = OneWayBinding::deferred(VOLUME);
    // An unrelated subscriber that must survive the binding's disposal.
    let _other = source.notifier().subscribe(|_| {});

    binding
        .resolve(Some(&DataContext::new(source.clone())), &0.0, &ignore())
        .unwrap();
    assert_eq!(source.notifier().subscriber_count(), 2);

    binding.dispose();
    binding.dispose();
    assert_eq!(source.notifier().subscriber_count(), 1);
}

#[test]
fn dropping_a_binding_releases_its_subscription() {
    let cell = Rc::new(ObservableValue::new(1_u16));
    {
        let mut binding: OneWayBinding<_, _, u32> =
            OneWayBinding::immediate(cell.clone(), ObservableValue::accessor());
        binding.resolve(None, &0, &ignore()).unwrap();
        assert_eq!(cell.notifier().subscriber_count(), 1);
    }
    assert_eq!(cell.notifier().subscriber_count(), 0);
}

#[test]
fn detaching_releases_a_deferred_source() {
    let source = settings(0.1);
    let weak = Rc::downgrade(&source);
    let mut binding: OneWayBinding<Settings, f64, f64> = OneWayBinding::deferred(VOLUME);

    binding
        .resolve(Some(&DataContext::new(source)), &0.0, &ignore())
        .unwrap();
    // The binding remembers the context it attached to.
    assert!(weak.upgrade().is_some());

    binding.resolve(None, &0.0, &ignore()).unwrap();
    assert!(weak.upgrade().is_none());
}

#[test]
fn deferred_two_way_follows_the_context() {
    let first = settings(0.25);
    let second = settings(0.75);
    let target = Rc::new(RefCell::new(String::new()));
    let writer = target.clone();
    let sink: Sink<String> = Rc::new(move |value: Result<String, BindingError>| {
        if let Ok(value) = value {
            *writer.borrow_mut() = value;
        }
    });
    let mut binding: TwoWayBinding<Settings, f64, String> = TwoWayBinding::deferred(VOLUME);

    binding
        .resolve(Some(&DataContext::new(first.clone())), &String::new(), &sink)
        .unwrap();
    assert_eq!(*target.borrow(), "0.25");

    binding.target_changed(&String::from("0.5")).unwrap();
    assert_eq!(first.volume.get(), 0.5);

    binding
        .resolve(Some(&DataContext::new(second.clone())), &String::new(), &sink)
        .unwrap();
    assert_eq!(*target.borrow(), "0.75");

    binding.target_changed(&String::from("1")).unwrap();
    assert_eq!(second.volume.get(), 1.0);
    assert_eq!(first.volume.get(), 0.5);
    assert_eq!(first.notifier().subscriber_count(), 0);
}
