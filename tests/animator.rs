mod tests {
    use std::sync::{Arc, Mutex};

    use approx::assert_relative_eq;
    use embassy_time::Timer;
    use futures::executor::block_on;
    use futures::future::join;
    use myrtio_gamma_composer::channel::TrySendError;
    use myrtio_gamma_composer::virtual_display::VirtualSession;
    use myrtio_gamma_composer::{
        AlertAnimation, AlertCommand, AnimationChannels, AnimationError, Animator, AnimatorConfig,
        Channel, ClockStart, DeviceError, Duration, ForeignUpdatePolicy, Frame, GammaDevice,
        GammaSession, Instant, LookupTable, TransferFn, VirtualDisplay,
    };

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Records the time every write starts, optionally taking a while per write
    #[derive(Clone)]
    struct TimedDisplay {
        display: VirtualDisplay,
        writes: Arc<Mutex<Vec<Instant>>>,
        write_delay: std::time::Duration,
    }

    impl TimedDisplay {
        fn new(display: VirtualDisplay) -> Self {
            Self::with_write_delay(display, std::time::Duration::ZERO)
        }

        fn with_write_delay(display: VirtualDisplay, write_delay: std::time::Duration) -> Self {
            Self {
                display,
                writes: Arc::new(Mutex::new(Vec::new())),
                write_delay,
            }
        }

        fn writes(&self) -> Vec<Instant> {
            self.writes.lock().unwrap().clone()
        }
    }

    struct TimedSession {
        session: VirtualSession,
        writes: Arc<Mutex<Vec<Instant>>>,
        write_delay: std::time::Duration,
    }

    impl GammaDevice for TimedDisplay {
        type Session = TimedSession;

        fn open(&mut self) -> Result<TimedSession, DeviceError> {
            Ok(TimedSession {
                session: self.display.open()?,
                writes: self.writes.clone(),
                write_delay: self.write_delay,
            })
        }
    }

    impl GammaSession for TimedSession {
        fn set_gamma(&mut self, curve: &TransferFn) -> Result<(), DeviceError> {
            self.writes.lock().unwrap().push(Instant::now());
            std::thread::sleep(self.write_delay);
            self.session.set_gamma(curve)
        }

        fn lookup_table(&mut self) -> Result<LookupTable, DeviceError> {
            self.session.lookup_table()
        }
    }

    /// Takes a while to open
    struct SlowDisplay(VirtualDisplay);

    impl GammaDevice for SlowDisplay {
        type Session = VirtualSession;

        fn open(&mut self) -> Result<VirtualSession, DeviceError> {
            std::thread::sleep(std::time::Duration::from_millis(100));
            self.0.open()
        }
    }

    /// Opens, but can't read back its tables
    struct WriteOnlyDisplay;

    struct WriteOnlySession;

    impl GammaDevice for WriteOnlyDisplay {
        type Session = WriteOnlySession;

        fn open(&mut self) -> Result<WriteOnlySession, DeviceError> {
            Ok(WriteOnlySession)
        }
    }

    impl GammaSession for WriteOnlySession {
        fn set_gamma(&mut self, _curve: &TransferFn) -> Result<(), DeviceError> {
            Ok(())
        }

        fn lookup_table(&mut self) -> Result<LookupTable, DeviceError> {
            Err(DeviceError::Read("tables are write-only".into()))
        }
    }

    /// Time of the first frame with the given clock start
    fn first_frame_time(clock_start: ClockStart) -> Duration {
        let channels = AnimationChannels::<()>::new();
        let first = Arc::new(Mutex::new(None));
        let recorder = first.clone();
        let driver = move |t: Duration, base: &TransferFn, _event: Option<()>| {
            recorder.lock().unwrap().get_or_insert(t);
            Frame::new(base.clone()).with_exit(true)
        };
        let config = AnimatorConfig {
            clock_start,
            ..AnimatorConfig::new()
        };
        let display = SlowDisplay(VirtualDisplay::new(1, 16));
        let (animator, _handle) = Animator::start(&channels, display, driver, config);
        block_on(animator.run());
        let first = first.lock().unwrap().unwrap();
        first
    }

    #[test]
    fn test_writes_respect_update_interval() {
        let channels = AnimationChannels::<()>::new();
        let display = TimedDisplay::new(VirtualDisplay::new(1, 16));
        let mut frames = 0;
        let driver = move |_t: Duration, base: &TransferFn, _event: Option<()>| {
            frames += 1;
            Frame::new(base.clone()).with_exit(frames == 10)
        };
        let config = AnimatorConfig {
            update_interval: ms(33),
            ..AnimatorConfig::new()
        };
        let (animator, mut handle) = Animator::start(&channels, display.clone(), driver, config);
        block_on(animator.run());

        assert_eq!(handle.termination.try_take(), Some(Ok(())));
        assert_eq!(handle.termination.try_take(), None);
        assert!(handle.termination.is_closed());

        // 10 frames and the restore
        let writes = display.writes();
        assert_eq!(writes.len(), 11);
        for pair in writes.windows(2) {
            assert!(pair[1] - pair[0] >= ms(33));
        }
    }

    #[test]
    fn test_slow_writes_keep_update_rate() {
        let channels = AnimationChannels::<()>::new();
        let display = TimedDisplay::with_write_delay(
            VirtualDisplay::new(1, 16),
            std::time::Duration::from_millis(20),
        );
        let mut frames = 0;
        let driver = move |_t: Duration, base: &TransferFn, _event: Option<()>| {
            frames += 1;
            Frame::new(base.clone()).with_exit(frames == 10)
        };
        let config = AnimatorConfig {
            update_interval: ms(33),
            restore_on_exit: false,
            ..AnimatorConfig::new()
        };
        let (animator, mut handle) = Animator::start(&channels, display.clone(), driver, config);
        block_on(animator.run());
        assert_eq!(handle.termination.try_take(), Some(Ok(())));

        let writes = display.writes();
        assert_eq!(writes.len(), 10);
        for pair in writes.windows(2) {
            assert!(pair[1] - pair[0] >= ms(33));
        }
        // Device latency must not add to the period
        let mean = (writes[9] - writes[0]) / 9;
        assert!(mean < ms(43), "mean write period {mean:?}");
    }

    #[test]
    fn test_early_event_keeps_writes_apart() {
        let channels = AnimationChannels::<u8>::new();
        let display = TimedDisplay::new(VirtualDisplay::new(1, 16));
        let driver = |_t: Duration, base: &TransferFn, event: Option<u8>| {
            Frame::new(base.clone())
                .with_sleep(Duration::from_secs(10))
                .with_exit(event.is_some())
        };
        let config = AnimatorConfig {
            update_interval: ms(100),
            restore_on_exit: false,
            ..AnimatorConfig::new()
        };
        let (animator, handle) = Animator::start(&channels, display.clone(), driver, config);
        let events = handle.events;
        let ((), outcome) = block_on(join(animator.run(), async move {
            events.send(1).await;
            handle.termination.wait().await
        }));

        assert_eq!(outcome, Ok(()));
        let writes = display.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[1] - writes[0] >= ms(100));
    }

    #[test]
    fn test_foreign_update_ends_animation() {
        let channels = AnimationChannels::<()>::new();
        let display = VirtualDisplay::new(2, 256);
        let driver = |_t: Duration, _base: &TransferFn, _event: Option<()>| {
            Frame::new(TransferFn::power(2.0))
        };
        let (animator, handle) =
            Animator::start(&channels, display.clone(), driver, AnimatorConfig::new());
        let observer = display.clone();
        let ((), outcome) = block_on(join(animator.run(), async move {
            while observer.write_count() < 3 {
                Timer::after(ms(5)).await;
            }
            observer.interfere(&TransferFn::dim(0.5));
            handle.termination.wait().await
        }));

        assert_eq!(outcome, Err(AnimationError::ForeignUpdate));
        // The foreign curve is left alone
        let level = display.sample(0, Channel::Red, 0.5).unwrap();
        assert_relative_eq!(level, 0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_foreign_update_rebases() {
        let channels = AnimationChannels::<()>::new();
        let display = VirtualDisplay::new(2, 256);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let driver = move |_t: Duration, base: &TransferFn, _event: Option<()>| {
            let mut seen = recorder.lock().unwrap();
            seen.push(base.apply(Channel::Red, 0.5));
            let rebased = seen.iter().filter(|level| **level < 0.4).count();
            Frame::new(TransferFn::power(2.0)).with_exit(rebased >= 2)
        };
        let config = AnimatorConfig {
            on_foreign_update: ForeignUpdatePolicy::Rebase,
            ..AnimatorConfig::new()
        };
        let (animator, handle) = Animator::start(&channels, display.clone(), driver, config);
        let observer = display.clone();
        let ((), outcome) = block_on(join(animator.run(), async move {
            while observer.write_count() < 3 {
                Timer::after(ms(5)).await;
            }
            observer.interfere(&TransferFn::dim(0.5));
            handle.termination.wait().await
        }));

        assert_eq!(outcome, Ok(()));
        let seen = seen.lock().unwrap();
        assert_relative_eq!(seen[0], 0.5, epsilon = 1e-3);
        assert_relative_eq!(*seen.last().unwrap(), 0.25, epsilon = 1e-3);
        // The rebased baseline is restored on both controllers
        for controller in 0..2 {
            let level = display.sample(controller, Channel::Red, 0.5).unwrap();
            assert_relative_eq!(level, 0.25, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_cancel_restores_baseline() {
        let channels = AnimationChannels::<()>::new();
        let display = VirtualDisplay::new(1, 256);
        let driver = |_t: Duration, _base: &TransferFn, _event: Option<()>| {
            Frame::new(TransferFn::dim(0.5)).with_sleep(Duration::from_secs(10))
        };
        let (animator, handle) =
            Animator::start(&channels, display.clone(), driver, AnimatorConfig::new());
        let cancel = handle.cancel;
        let started = Instant::now();
        let ((), outcome) = block_on(join(animator.run(), async move {
            Timer::after(ms(50)).await;
            cancel.cancel();
            cancel.cancel();
            handle.termination.wait().await
        }));
        cancel.cancel();

        assert_eq!(outcome, Ok(()));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(display.write_count(), 2);
        let level = display.sample(0, Channel::Red, 0.5).unwrap();
        assert_relative_eq!(level, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_channels_can_be_reused() {
        let channels = AnimationChannels::<()>::new();
        let sleepy = |_t: Duration, base: &TransferFn, _event: Option<()>| {
            Frame::new(base.clone()).with_sleep(Duration::from_secs(10))
        };
        let (animator, handle) = Animator::start(
            &channels,
            VirtualDisplay::new(1, 16),
            sleepy,
            AnimatorConfig::new(),
        );
        let cancel = handle.cancel;
        let ((), outcome) = block_on(join(animator.run(), async move {
            Timer::after(ms(20)).await;
            cancel.cancel();
            handle.termination.wait().await
        }));
        assert_eq!(outcome, Ok(()));
        // Stale cancellation from the first run
        cancel.cancel();

        let display = VirtualDisplay::new(1, 16);
        let mut frames = 0;
        let counted = move |_t: Duration, base: &TransferFn, _event: Option<()>| {
            frames += 1;
            Frame::new(base.clone()).with_exit(frames == 3)
        };
        let (animator, mut handle) =
            Animator::start(&channels, display.clone(), counted, AnimatorConfig::new());
        block_on(animator.run());
        assert_eq!(handle.termination.try_take(), Some(Ok(())));
        assert_eq!(display.write_count(), 4);
    }

    #[test]
    fn test_events_are_delivered_in_order() {
        let channels = AnimationChannels::<u8>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let driver = move |_t: Duration, base: &TransferFn, event: Option<u8>| {
            let mut seen = recorder.lock().unwrap();
            if let Some(event) = event {
                seen.push(event);
            }
            let done = seen.len() == 3;
            let sleep = if done { ms(0) } else { Duration::from_secs(10) };
            Frame::new(base.clone()).with_sleep(sleep).with_exit(done)
        };
        let (animator, handle) = Animator::start(
            &channels,
            VirtualDisplay::new(1, 16),
            driver,
            AnimatorConfig::new(),
        );
        let events = handle.events;
        let started = Instant::now();
        let ((), outcome) = block_on(join(animator.run(), async move {
            for event in 1..=3 {
                events.send(event).await;
            }
            handle.termination.wait().await
        }));

        assert_eq!(outcome, Ok(()));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_try_send_reports_full_queue() {
        let channels = AnimationChannels::<u8>::new();
        let events = channels.event_sender();
        assert_eq!(events.try_send(1), Ok(()));
        assert_eq!(events.try_send(2), Err(TrySendError(2)));
    }

    #[test]
    fn test_setup_failure() {
        let channels = AnimationChannels::<()>::new();
        let display = VirtualDisplay::new(1, 16);
        display.set_unavailable(true);
        let driver = |_t: Duration, base: &TransferFn, _event: Option<()>| Frame::new(base.clone());
        let (animator, mut handle) =
            Animator::start(&channels, display.clone(), driver, AnimatorConfig::new());
        block_on(animator.run());

        assert!(matches!(
            handle.termination.try_take(),
            Some(Err(AnimationError::Setup(DeviceError::Unavailable(_))))
        ));
        assert_eq!(display.write_count(), 0);
    }

    #[test]
    fn test_read_failure() {
        let channels = AnimationChannels::<()>::new();
        let driver = |_t: Duration, base: &TransferFn, _event: Option<()>| Frame::new(base.clone());
        let (animator, mut handle) =
            Animator::start(&channels, WriteOnlyDisplay, driver, AnimatorConfig::new());
        block_on(animator.run());

        assert_eq!(
            handle.termination.try_take(),
            Some(Err(AnimationError::Read(DeviceError::Read(
                "tables are write-only".into()
            ))))
        );
    }

    #[test]
    fn test_exit_without_restore() {
        let channels = AnimationChannels::<()>::new();
        let display = VirtualDisplay::new(1, 256);
        let mut frames = 0;
        let driver = move |_t: Duration, _base: &TransferFn, _event: Option<()>| {
            frames += 1;
            Frame::new(TransferFn::dim(0.5)).with_exit(frames == 2)
        };
        let config = AnimatorConfig {
            restore_on_exit: false,
            ..AnimatorConfig::new()
        };
        let (animator, mut handle) = Animator::start(&channels, display.clone(), driver, config);
        block_on(animator.run());

        assert_eq!(handle.termination.try_take(), Some(Ok(())));
        assert_eq!(display.write_count(), 2);
        let level = display.sample(0, Channel::Red, 0.5).unwrap();
        assert_relative_eq!(level, 0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_initial_clock_offset() {
        let channels = AnimationChannels::<()>::new();
        let first = Arc::new(Mutex::new(None));
        let recorder = first.clone();
        let driver = move |t: Duration, base: &TransferFn, _event: Option<()>| {
            recorder.lock().unwrap().get_or_insert(t);
            Frame::new(base.clone()).with_exit(true)
        };
        let config = AnimatorConfig {
            initial_clock: Duration::from_secs(10),
            ..AnimatorConfig::new()
        };
        let (animator, _handle) =
            Animator::start(&channels, VirtualDisplay::new(1, 16), driver, config);
        block_on(animator.run());

        let first = first.lock().unwrap().unwrap();
        assert!(first >= Duration::from_secs(10));
        assert!(first < Duration::from_secs(11));
    }

    #[test]
    fn test_clock_start() {
        assert!(first_frame_time(ClockStart::BeforeSetup) >= ms(100));
        assert!(first_frame_time(ClockStart::AfterSetup) < ms(100));
    }

    #[test]
    fn test_updates_per_second() {
        let config = AnimatorConfig::new().with_updates_per_second(50);
        assert_eq!(config.update_interval, ms(20));
        let unchanged = AnimatorConfig::new().with_updates_per_second(0);
        assert_eq!(
            unchanged.update_interval,
            myrtio_gamma_composer::DEFAULT_UPDATE_INTERVAL
        );
    }

    #[test]
    fn test_alert_lifecycle() {
        let channels = AnimationChannels::<AlertCommand>::new();
        let display = VirtualDisplay::new(2, 256);
        let (animator, handle) = Animator::start(
            &channels,
            display.clone(),
            AlertAnimation::new(),
            AnimatorConfig::new(),
        );
        let observer = display.clone();
        let events = handle.events;
        let ((), (red, green, outcome)) = block_on(join(animator.run(), async move {
            Timer::after(ms(400)).await;
            let red = observer.sample(1, Channel::Red, 0.5).unwrap();
            let green = observer.sample(1, Channel::Green, 0.5).unwrap();
            events.send(AlertCommand::Exit).await;
            (red, green, handle.termination.wait().await)
        }));

        assert_relative_eq!(red, 0.6, epsilon = 2e-3);
        assert_relative_eq!(green, 0.5, epsilon = 2e-3);
        assert_eq!(outcome, Ok(()));
        for controller in 0..2 {
            let level = display.sample(controller, Channel::Red, 0.5).unwrap();
            assert_relative_eq!(level, 0.5, epsilon = 2e-3);
        }
    }
}
