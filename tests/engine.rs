mod tests {
    use embassy_time::Duration;
    use haptic_sequencer::{
        ActuationCall, ActuationChannel, DEFAULT_MIN_WAIT, EffectEntry, EffectRegistry,
        EngineError, HapticEngine, PlaybackMode, Rearm, SequenceKind, TimerCommand,
        VibrationMode,
    };

    const QUEUE_SIZE: usize = 8;

    fn registry() -> EffectRegistry<4> {
        let entries = [
            EffectEntry {
                name: "haptic.clock.timer",
                kind: SequenceKind::TimedWaveform,
                values: &[0, 100, 30, 100],
            },
            EffectEntry {
                name: "haptic.default.effect",
                kind: SequenceKind::EffectCodeList,
                values: &[0, 5, 200, 9],
            },
        ];
        EffectRegistry::load(&entries, true).unwrap()
    }

    fn drain<const N: usize>(calls: &ActuationChannel<N>) -> Vec<ActuationCall> {
        let mut drained = Vec::new();
        while let Ok(call) = calls.try_receive() {
            drained.push(call);
        }
        drained
    }

    fn take_arm<const E: usize, const Q: usize>(engine: &HapticEngine<'_, E, Q>) -> Rearm {
        match engine.try_take_timer_command() {
            Some(TimerCommand::Arm(rearm)) => rearm,
            other => panic!("expected an arm command, got {other:?}"),
        }
    }

    #[test]
    fn test_once_playback_runs_to_completion() {
        let registry = EffectRegistry::<4>::empty();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_once(500).unwrap();
        assert_eq!(engine.mode(), PlaybackMode::Once);
        let rearm = take_arm(&engine);
        assert_eq!(rearm.wait, DEFAULT_MIN_WAIT);

        // lead-in elapses: actuation starts, timer holds the duration
        let rearm = engine.on_timer_fired(rearm.token).unwrap();
        assert_eq!(rearm.wait, Duration::from_millis(500));
        assert_eq!(drain(&calls), [ActuationCall::Start]);

        // duration elapses: the final toggle is the one and only stop
        assert_eq!(engine.on_timer_fired(rearm.token), None);
        assert_eq!(drain(&calls), [ActuationCall::Stop]);
        assert_eq!(engine.mode(), PlaybackMode::Idle);
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let registry = EffectRegistry::<4>::empty();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        assert_eq!(engine.start_once(0), Err(EngineError::InvalidArgument));
        assert_eq!(engine.mode(), PlaybackMode::Idle);
        assert!(engine.try_take_timer_command().is_none());
    }

    #[test]
    fn test_second_start_while_running_is_busy() {
        let registry = registry();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_once(500).unwrap();
        assert_eq!(engine.start_once(200), Err(EngineError::Busy));
        assert_eq!(
            engine.start_preset("haptic.clock.timer"),
            Err(EngineError::Busy)
        );
        assert_eq!(engine.mode(), PlaybackMode::Once);
    }

    #[test]
    fn test_stop_while_idle_is_a_quiet_no_op() {
        let registry = EffectRegistry::<4>::empty();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        assert_eq!(engine.stop(VibrationMode::Once), Ok(()));
        assert_eq!(engine.stop(VibrationMode::Preset), Ok(()));
        assert!(drain(&calls).is_empty());
        assert!(engine.try_take_timer_command().is_none());
    }

    #[test]
    fn test_stop_with_mismatched_mode_leaves_playback_alone() {
        let registry = EffectRegistry::<4>::empty();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_once(500).unwrap();
        let rearm = take_arm(&engine);

        assert_eq!(engine.stop(VibrationMode::Preset), Ok(()));
        assert_eq!(engine.mode(), PlaybackMode::Once);
        assert!(engine.try_take_timer_command().is_none());

        // the session is untouched and still accepts its firing
        assert!(engine.on_timer_fired(rearm.token).is_some());
        assert_eq!(drain(&calls), [ActuationCall::Start]);
    }

    #[test]
    fn test_stop_cancels_the_armed_timer() {
        let registry = EffectRegistry::<4>::empty();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_once(500).unwrap();
        let rearm = take_arm(&engine);

        engine.stop(VibrationMode::Once).unwrap();
        assert_eq!(engine.mode(), PlaybackMode::Idle);
        assert_eq!(engine.try_take_timer_command(), Some(TimerCommand::Disarm));
        assert_eq!(drain(&calls), [ActuationCall::Stop]);

        // a firing that raced the stop presents a stale token
        assert_eq!(engine.on_timer_fired(rearm.token), None);
        assert!(drain(&calls).is_empty());
    }

    #[test]
    fn test_stop_racing_a_firing_always_ends_switched_off() {
        const ROUNDS: usize = 30_000;
        let registry = EffectRegistry::<4>::empty();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);
        let barrier = std::sync::Barrier::new(2);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..ROUNDS {
                    barrier.wait();
                    engine.stop(VibrationMode::Once).unwrap();
                    barrier.wait();
                }
            });

            for _ in 0..ROUNDS {
                engine.start_once(500).unwrap();
                let rearm = take_arm(&engine);
                barrier.wait();
                engine.on_timer_fired(rearm.token);
                barrier.wait();

                // whichever side won the interleaving, the queue must
                // end switched off and the engine must be idle
                let drained = drain(&calls);
                assert_eq!(drained.last(), Some(&ActuationCall::Stop));
                assert_eq!(engine.mode(), PlaybackMode::Idle);
                engine.try_take_timer_command();
            }
        });
    }

    #[test]
    fn test_stale_token_after_completion_does_nothing() {
        let registry = EffectRegistry::<4>::empty();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_once(500).unwrap();
        let first = take_arm(&engine);
        let second = engine.on_timer_fired(first.token).unwrap();
        assert_eq!(engine.on_timer_fired(second.token), None);
        drain(&calls);

        assert_eq!(engine.on_timer_fired(second.token), None);
        assert_eq!(engine.on_timer_fired(first.token), None);
        assert!(drain(&calls).is_empty());
    }

    #[test]
    fn test_completed_session_frees_the_engine() {
        let registry = registry();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_once(100).unwrap();
        let rearm = take_arm(&engine);
        let rearm = engine.on_timer_fired(rearm.token).unwrap();
        assert_eq!(engine.on_timer_fired(rearm.token), None);
        drain(&calls);

        engine.start_preset("haptic.clock.timer").unwrap();
        assert_eq!(engine.mode(), PlaybackMode::Preset);
    }

    #[test]
    fn test_preset_waveform_runs_to_completion() {
        let registry = registry();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_preset("haptic.clock.timer").unwrap();
        assert_eq!(engine.mode(), PlaybackMode::Preset);

        // configured first wait of 0 ms is clamped to the floor
        let rearm = take_arm(&engine);
        assert_eq!(rearm.wait, DEFAULT_MIN_WAIT);

        let rearm = engine.on_timer_fired(rearm.token).unwrap();
        assert_eq!(rearm.wait, Duration::from_millis(100));
        assert_eq!(drain(&calls), [ActuationCall::Start]);

        let rearm = engine.on_timer_fired(rearm.token).unwrap();
        assert_eq!(rearm.wait, DEFAULT_MIN_WAIT);
        assert_eq!(drain(&calls), [ActuationCall::Stop]);

        let rearm = engine.on_timer_fired(rearm.token).unwrap();
        assert_eq!(rearm.wait, Duration::from_millis(100));
        assert_eq!(drain(&calls), [ActuationCall::Start]);

        assert_eq!(engine.on_timer_fired(rearm.token), None);
        assert_eq!(drain(&calls), [ActuationCall::Stop]);
        assert_eq!(engine.mode(), PlaybackMode::Idle);
    }

    #[test]
    fn test_preset_code_list_fires_effects_then_stops() {
        let registry = registry();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_preset("haptic.default.effect").unwrap();
        let rearm = take_arm(&engine);
        assert_eq!(rearm.wait, DEFAULT_MIN_WAIT);

        let rearm = engine.on_timer_fired(rearm.token).unwrap();
        assert_eq!(rearm.wait, Duration::from_millis(200));
        assert_eq!(drain(&calls), [ActuationCall::StartEffect(5)]);

        // final pair: trigger the effect, then end the run
        assert_eq!(engine.on_timer_fired(rearm.token), None);
        assert_eq!(
            drain(&calls),
            [ActuationCall::StartEffect(9), ActuationCall::Stop]
        );
        assert_eq!(engine.mode(), PlaybackMode::Idle);
    }

    #[test]
    fn test_unknown_preset_is_not_supported() {
        let registry = registry();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        assert_eq!(
            engine.start_preset("haptic.unknown"),
            Err(EngineError::NotSupported)
        );
        assert_eq!(engine.mode(), PlaybackMode::Idle);
        assert!(engine.try_take_timer_command().is_none());
    }

    #[test]
    fn test_presets_disabled_by_registry_flag() {
        let entries = [EffectEntry {
            name: "haptic.clock.timer",
            kind: SequenceKind::TimedWaveform,
            values: &[0, 100],
        }];
        let registry = EffectRegistry::<4>::load(&entries, false).unwrap();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        assert_eq!(
            engine.start_preset("haptic.clock.timer"),
            Err(EngineError::NotSupported)
        );
        engine.start_once(200).unwrap();
        assert_eq!(engine.mode(), PlaybackMode::Once);
    }

    #[test]
    fn test_full_queue_refuses_new_playback() {
        let registry = registry();
        let calls = ActuationChannel::<2>::new();
        let engine = HapticEngine::new(&registry, &calls);

        calls.try_send(ActuationCall::Stop).unwrap();
        calls.try_send(ActuationCall::Stop).unwrap();

        assert_eq!(engine.start_once(100), Err(EngineError::ResourceExhausted));
        assert_eq!(
            engine.start_preset("haptic.clock.timer"),
            Err(EngineError::ResourceExhausted)
        );
        assert_eq!(engine.mode(), PlaybackMode::Idle);

        // draining the queue clears the condition
        drain(&calls);
        engine.start_once(100).unwrap();
    }

    #[test]
    fn test_running_engine_reports_busy_even_with_a_full_queue() {
        let registry = registry();
        let calls = ActuationChannel::<2>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_once(500).unwrap();
        calls.try_send(ActuationCall::Stop).unwrap();
        calls.try_send(ActuationCall::Stop).unwrap();

        // the session guard outranks the queue guard
        assert_eq!(engine.start_once(200), Err(EngineError::Busy));
        assert_eq!(
            engine.start_preset("haptic.clock.timer"),
            Err(EngineError::Busy)
        );
        assert_eq!(engine.mode(), PlaybackMode::Once);
    }

    #[test]
    fn test_custom_min_wait_shortens_the_lead_in() {
        let registry = EffectRegistry::<4>::empty();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine =
            HapticEngine::new(&registry, &calls).with_min_wait(Duration::from_millis(10));
        assert_eq!(engine.min_wait(), Duration::from_millis(10));

        engine.start_once(500).unwrap();
        let rearm = take_arm(&engine);
        assert_eq!(rearm.wait, Duration::from_millis(10));

        let rearm = engine.on_timer_fired(rearm.token).unwrap();
        assert_eq!(rearm.wait, Duration::from_millis(500));
    }

    #[test]
    fn test_new_start_replaces_a_pending_arm_command() {
        let registry = registry();
        let calls = ActuationChannel::<QUEUE_SIZE>::new();
        let engine = HapticEngine::new(&registry, &calls);

        engine.start_once(500).unwrap();
        engine.stop(VibrationMode::Once).unwrap();
        engine.start_preset("haptic.clock.timer").unwrap();

        // the sequencer that never woke up only sees the newest command
        let rearm = take_arm(&engine);
        assert!(engine.on_timer_fired(rearm.token).is_some());
        assert_eq!(engine.mode(), PlaybackMode::Preset);
    }

    #[test]
    fn test_vibration_mode_tags_round_trip() {
        assert_eq!(VibrationMode::from_raw(0), Some(VibrationMode::Once));
        assert_eq!(VibrationMode::from_raw(1), Some(VibrationMode::Preset));
        assert_eq!(VibrationMode::from_raw(2), None);
        assert_eq!(VibrationMode::Once.as_raw(), 0);
        assert_eq!(VibrationMode::Preset.as_raw(), 1);
        assert_eq!(VibrationMode::Once.as_str(), "once");
        assert_eq!(VibrationMode::Preset.as_str(), "preset");
    }
}
