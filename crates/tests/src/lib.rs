//! # Integration Tests
//!
//! End-to-end tests over the public engine surface: phase discipline,
//! the motivating two-trial scenario, robustness to missing and spurious
//! anchors, and the order-preservation and round-trip properties.

#[cfg(test)]
mod scenario_tests {
    use align_engine::Aligner;
    use chrono::{Duration, TimeZone, Utc};
    use contracts::{EventRecord, WallClockAnchor};

    fn two_trial_records() -> Vec<EventRecord> {
        vec![
            EventRecord::coded(10.1, 19).in_trial(1),
            EventRecord::coded(15.2, 23).in_trial(1),
            EventRecord::coded(19.8, 25).in_trial(1),
            EventRecord::coded(30.5, 19).in_trial(2),
            EventRecord::coded(35.8, 23).in_trial(2),
            EventRecord::coded(39.9, 25).in_trial(2),
        ]
    }

    fn scenario_aligner() -> Aligner {
        let mut aligner = Aligner::default();
        aligner
            .add_segment("task", two_trial_records())
            .unwrap()
            .with_anchors(|e| e.code == Some(19));
        aligner.build().unwrap();
        aligner
            .add_sync_context(
                "probe0",
                vec![10.0, 20.0, 30.0, 40.0],
                vec![300_000, 600_000, 900_000, 1_200_000],
                30_000.0,
            )
            .unwrap();
        aligner
    }

    /// The motivating example: anchor code 19, one probe at 30 kHz.
    #[test]
    fn test_two_trial_scenario_indices() {
        let aligner = scenario_aligner();
        let table = aligner.get_final_dataframe().unwrap();

        let columns = table.context("probe0").unwrap();
        let index_of = |time: f64| {
            let row = table
                .event_times()
                .iter()
                .position(|t| (t - time).abs() < 1e-9)
                .unwrap();
            columns.ephys_index()[row].unwrap()
        };

        assert_eq!(index_of(10.1), 303_000);
        assert_eq!(index_of(30.5), 915_000);
        assert!(table.warnings().is_empty());
    }

    #[test]
    fn test_table_schema() {
        let table = scenario_aligner().get_final_dataframe().unwrap();

        assert_eq!(
            table.headers(),
            vec![
                "segment_name",
                "EventTime",
                "BehavioralCode",
                "TrialID",
                "is_anchor",
                "global_index",
                "EphysTime_probe0",
                "EphysIndice_probe0",
                "AbsoluteDateTime",
            ]
        );
        assert_eq!(table.len(), 6);
        assert_eq!(table.global_indices().to_vec(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(
            table.anchor_flags().to_vec(),
            vec![true, false, false, true, false, false]
        );
    }

    #[test]
    fn test_table_serializes_to_records() {
        let table = scenario_aligner().get_final_dataframe().unwrap();
        let json = serde_json::to_value(&table).unwrap();
        let records = json.as_array().unwrap();

        assert_eq!(records.len(), 6);
        assert_eq!(records[0]["segment_name"], "task");
        assert_eq!(records[0]["BehavioralCode"], 19);
        assert_eq!(records[0]["EphysIndice_probe0"], 303_000);
        assert_eq!(records[3]["EphysIndice_probe0"], 915_000);
    }

    #[test]
    fn test_advisory_wallclock_column() {
        let mut aligner = scenario_aligner();
        let reference = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();
        aligner.set_wallclock_anchor(WallClockAnchor {
            context: "probe0".into(),
            wall_time: reference,
            ephys_time: 10.0,
        });

        let table = aligner.get_final_dataframe().unwrap();
        let stamps = table.absolute_datetimes();
        // The matched anchor at 10.1 maps to ephys time 10.0, the reference
        assert_eq!(stamps[0], Some(reference));
        // The trial-2 anchor maps to ephys time 30.0, twenty seconds later
        assert_eq!(stamps[3], Some(reference + Duration::seconds(20)));
    }

    #[test]
    fn test_multiple_contexts_are_independent() {
        let mut aligner = scenario_aligner();
        // A second probe with a 2 s offset recording clock, 20 kHz
        aligner
            .add_sync_context(
                "probe1",
                vec![12.0, 22.0, 32.0, 42.0],
                vec![240_000, 440_000, 640_000, 840_000],
                20_000.0,
            )
            .unwrap();

        let table = aligner.get_final_dataframe().unwrap();
        assert_eq!(table.contexts().len(), 2);

        // probe0 unchanged by probe1's registration
        assert_eq!(
            table.context("probe0").unwrap().ephys_index()[0],
            Some(303_000)
        );
        // probe1: anchor 10.1 matches the pulse at 12.0 (offset removed),
        // so its row sits 1.9 s = 38000 samples before that pulse at 20 kHz
        assert_eq!(
            table.context("probe1").unwrap().ephys_index()[0],
            Some(202_000)
        );
    }
}

#[cfg(test)]
mod property_tests {
    use align_engine::Aligner;
    use contracts::EventRecord;

    /// Round trip: indices are exactly time x rate and anchor times agree,
    /// so every mapped index reduces to time x rate.
    #[test]
    fn test_exact_round_trip() {
        let rate = 1000.0;
        let anchor_times = [10.0, 20.0, 30.0, 40.0, 50.0];
        let mut records: Vec<EventRecord> =
            anchor_times.iter().map(|&t| EventRecord::coded(t, 1)).collect();
        // Non-anchor events between anchors
        records.push(EventRecord::coded(14.5, 2));
        records.push(EventRecord::coded(33.25, 2));

        let mut aligner = Aligner::default();
        aligner
            .add_segment("task", records)
            .unwrap()
            .with_anchors(|e| e.code == Some(1));
        aligner.build().unwrap();
        aligner
            .add_sync_context(
                "probe0",
                anchor_times.to_vec(),
                anchor_times.iter().map(|&t| (t * rate) as i64).collect(),
                rate,
            )
            .unwrap();

        let table = aligner.get_final_dataframe().unwrap();
        let columns = table.context("probe0").unwrap();
        for (row, &time) in table.event_times().iter().enumerate() {
            assert_eq!(
                columns.ephys_index()[row],
                Some((time * rate).round() as i64),
                "row {row} at t={time}"
            );
            assert!((columns.ephys_time()[row].unwrap() - time).abs() < 1e-9);
        }
    }

    /// Removing one behavioral anchor must not disturb the others.
    #[test]
    fn test_missing_behavioral_anchor() {
        let rate = 1000.0;
        let ephys_times = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let ephys_indices: Vec<i64> = ephys_times.iter().map(|&t| (t * rate) as i64).collect();

        // The pulse at 30 s never made it into the behavioral log
        let records = vec![
            EventRecord::coded(10.0, 1),
            EventRecord::coded(20.0, 1),
            EventRecord::coded(25.0, 2),
            EventRecord::coded(40.0, 1),
            EventRecord::coded(50.0, 1),
        ];

        let mut aligner = Aligner::default();
        aligner
            .add_segment("task", records)
            .unwrap()
            .with_anchors(|e| e.code == Some(1));
        aligner.build().unwrap();
        aligner
            .add_sync_context("probe0", ephys_times, ephys_indices, rate)
            .unwrap();

        let table = aligner.get_final_dataframe().unwrap();
        assert!(table.warnings().is_empty());

        let columns = table.context("probe0").unwrap();
        for (row, &time) in table.event_times().iter().enumerate() {
            assert_eq!(columns.ephys_index()[row], Some((time * rate) as i64));
        }
    }

    /// A spurious behavioral anchor is reported unmatched but still gets an
    /// interpolated value from its matched neighbors.
    #[test]
    fn test_spurious_behavioral_anchor() {
        let rate = 1000.0;
        let ephys_times = vec![10.0, 20.0, 30.0, 40.0];
        let ephys_indices: Vec<i64> = ephys_times.iter().map(|&t| (t * rate) as i64).collect();

        // Anchor at 25 s has no ephys counterpart
        let records = vec![
            EventRecord::coded(10.0, 1),
            EventRecord::coded(20.0, 1),
            EventRecord::coded(25.0, 1),
            EventRecord::coded(30.0, 1),
            EventRecord::coded(40.0, 1),
        ];

        let mut aligner = Aligner::default();
        aligner
            .add_segment("task", records)
            .unwrap()
            .with_anchors(|e| e.code == Some(1));
        aligner.build().unwrap();
        aligner
            .add_sync_context("probe0", ephys_times, ephys_indices, rate)
            .unwrap();

        let table = aligner.get_final_dataframe().unwrap();
        let columns = table.context("probe0").unwrap();

        // Neighbors map exactly; the spurious anchor interpolates between
        // its bracketing matches
        assert_eq!(columns.ephys_index()[1], Some(20_000));
        assert_eq!(columns.ephys_index()[2], Some(25_000));
        assert_eq!(columns.ephys_index()[3], Some(30_000));

        let reports = aligner.context_reports();
        assert_eq!(reports[0].matched_anchors, 4);
        assert_eq!(reports[0].unmatched_anchors, 1);
    }

    /// Mapped index is monotone in event time even with clock drift.
    #[test]
    fn test_order_preservation_under_drift() {
        let rate = 30_000.0;
        // Ephys clock starts 5 s later and runs 0.2% fast
        let behavioral: Vec<f64> = (0..12).map(|i| i as f64 * 7.5).collect();
        let ephys_times: Vec<f64> = behavioral.iter().map(|&t| 5.0 + t * 1.002).collect();
        let ephys_indices: Vec<i64> = ephys_times.iter().map(|&t| (t * rate) as i64).collect();

        let mut records: Vec<EventRecord> =
            behavioral.iter().map(|&t| EventRecord::coded(t, 1)).collect();
        for i in 0..11 {
            records.push(EventRecord::coded(i as f64 * 7.5 + 3.1, 2));
        }

        let mut aligner = Aligner::default();
        aligner
            .add_segment("task", records)
            .unwrap()
            .with_anchors(|e| e.code == Some(1));
        aligner.build().unwrap();
        aligner
            .add_sync_context("probe0", ephys_times, ephys_indices, rate)
            .unwrap();

        let table = aligner.get_final_dataframe().unwrap();
        assert!(table.warnings().is_empty());

        let columns = table.context("probe0").unwrap();
        let mut previous = i64::MIN;
        for row in 0..table.len() {
            let index = columns.ephys_index()[row].unwrap();
            assert!(
                index >= previous,
                "index regressed at row {row} (t={})",
                table.event_times()[row]
            );
            previous = index;
        }
    }
}

#[cfg(test)]
mod phase_tests {
    use align_engine::Aligner;
    use contracts::{CoreError, EventRecord};

    #[test]
    fn test_dataframe_before_build_fails() {
        let aligner = Aligner::default();
        assert!(matches!(
            aligner.get_final_dataframe(),
            Err(CoreError::Phase { .. })
        ));
    }

    #[test]
    fn test_double_build_fails() {
        let mut aligner = Aligner::default();
        aligner
            .add_segment("task", vec![EventRecord::at(1.0)])
            .unwrap();
        aligner.build().unwrap();
        assert!(matches!(aligner.build(), Err(CoreError::Phase { .. })));
    }

    #[test]
    fn test_duplicate_context_name_fails() {
        let mut aligner = Aligner::default();
        aligner
            .add_segment("task", vec![EventRecord::at(1.0), EventRecord::at(2.0)])
            .unwrap();
        aligner.build().unwrap();
        aligner
            .add_sync_context("probe0", vec![1.0, 2.0], vec![1000, 2000], 1000.0)
            .unwrap();
        let result = aligner.add_sync_context("probe0", vec![1.0, 2.0], vec![1000, 2000], 1000.0);
        assert!(matches!(result, Err(CoreError::DuplicateContext { .. })));
    }
}

#[cfg(test)]
mod config_tests {
    use align_engine::Aligner;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{EventRecord, WarningKind};

    /// A configured tolerance turns a structurally bad match into a warning
    /// with null columns, not an error.
    #[test]
    fn test_configured_tolerance_null_fills() {
        let config = ConfigLoader::load_from_str(
            "[dtw]\nmax_mean_cost = 0.05\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let mut aligner = Aligner::new(config);
        aligner
            .add_segment(
                "task",
                vec![
                    EventRecord::at(0.0),
                    EventRecord::at(1.0),
                    EventRecord::at(2.0),
                ],
            )
            .unwrap();
        aligner.build().unwrap();
        // Rhythm disagrees badly: wrong anchor code was chosen upstream
        aligner
            .add_sync_context("probe0", vec![0.0, 8.0, 21.0], vec![0, 8000, 21_000], 1000.0)
            .unwrap();

        let table = aligner.get_final_dataframe().unwrap();
        assert!(table
            .context("probe0")
            .unwrap()
            .ephys_index()
            .iter()
            .all(Option::is_none));
        assert!(table
            .warnings()
            .iter()
            .any(|w| matches!(w.kind, WarningKind::MeanCostExceeded { .. })));
    }
}

#[cfg(test)]
mod observability_tests {
    use align_engine::Aligner;
    use contracts::EventRecord;
    use observability::AlignmentMetricsAggregator;

    #[test]
    fn test_aggregator_over_context_reports() {
        let mut aligner = Aligner::default();
        aligner
            .add_segment(
                "task",
                vec![
                    EventRecord::at(1.0),
                    EventRecord::at(2.0),
                    EventRecord::at(3.0),
                ],
            )
            .unwrap();
        aligner.build().unwrap();
        aligner
            .add_sync_context("probe0", vec![1.0, 2.0, 3.0], vec![100, 200, 300], 100.0)
            .unwrap();
        aligner
            .add_sync_context("empty", Vec::new(), Vec::new(), 100.0)
            .unwrap();

        let mut aggregator = AlignmentMetricsAggregator::new();
        for report in aligner.context_reports() {
            aggregator.update(report);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_contexts, 2);
        assert_eq!(summary.total_matched, 3);
        assert_eq!(summary.total_unmapped_pairs, 1);
        assert_eq!(summary.warnings_by_context.get("empty"), Some(&1));
    }
}
