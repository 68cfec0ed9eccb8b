use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scenario::{Interpolation, Signals, TimeSeriesSet, parse};

#[derive(Clone, Debug)]
struct Scenario {
    times: Vec<f64>,
    rows: Vec<Vec<Option<f64>>>,
    policies: Vec<Interpolation>,
}

impl Scenario {
    fn scenario_text(&self) -> String {
        self.times
            .iter()
            .zip(&self.rows)
            .map(|(t, row)| {
                let fields: Vec<String> = row
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
                    .collect();
                format!("[{t};{}]", fields.join(";"))
            })
            .collect()
    }

    fn interpolation_text(&self) -> String {
        let tokens: Vec<&str> = self.policies.iter().map(|p| p.token()).collect();
        format!("[;{}]", tokens.join(";"))
    }

    fn parse(&self) -> TimeSeriesSet {
        let parsed = parse(&self.scenario_text(), &self.interpolation_text(), 1000);
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        parsed.series
    }
}

/// Scenarios with ascending times. `min_step` of zero allows repeated times.
fn scenarios(min_step: f64) -> impl Strategy<Value = Scenario> {
    (1usize..4)
        .prop_flat_map(move |columns| {
            (
                -5.0f64..5.0,
                prop::collection::vec(
                    (
                        min_step..3.0,
                        prop::collection::vec(prop::option::weighted(0.7, -100.0f64..100.0), columns),
                    ),
                    1..20,
                ),
                prop::collection::vec(
                    prop::sample::select(enum_iterator::all::<Interpolation>().collect::<Vec<_>>()),
                    columns,
                ),
            )
        })
        .prop_map(|(start, steps, policies)| {
            let mut time = start;
            let mut times = Vec::with_capacity(steps.len());
            let mut rows = Vec::with_capacity(steps.len());
            for (i, (step, row)) in steps.into_iter().enumerate() {
                if i > 0 {
                    time += step;
                }
                times.push(time);
                rows.push(row);
            }
            Scenario {
                times,
                rows,
                policies,
            }
        })
}

proptest! {
    #[test]
    fn stored_times_return_stored_values(scenario in scenarios(0.01)) {
        let mut signals = Signals::new(scenario.parse());
        let columns = scenario.policies.len();
        let mut last = vec![None; columns];

        for (time, row) in scenario.times.iter().zip(&scenario.rows) {
            for c in 0..columns {
                if let Some(v) = row[c] {
                    last[c] = Some(v);
                }
                prop_assert_eq!(signals.value_at(c, *time), Some(last[c].unwrap_or(0.0)));
            }
        }
    }

    #[test]
    fn before_first_sample_is_zero(scenario in scenarios(0.0), before in 0.001f64..1e6) {
        let mut signals = Signals::new(scenario.parse());
        let first = scenario.times[0];
        for c in 0..scenario.policies.len() {
            prop_assert_eq!(signals.value_at(c, first - before), Some(0.0));
        }
    }

    #[test]
    fn parsing_is_repeatable(scenario in scenarios(0.0)) {
        prop_assert_eq!(scenario.parse(), scenario.parse());
    }

    #[test]
    fn warm_and_cold_hints_agree(
        scenario in scenarios(0.0),
        queries in prop::collection::vec(-10.0f64..70.0, 1..60),
    ) {
        let series = scenario.parse();
        let mut warm = Signals::new(series.clone());
        for (i, t) in queries.iter().enumerate() {
            let c = i % scenario.policies.len();
            let mut cold = Signals::new(series.clone());
            prop_assert_eq!(warm.value_at(c, *t), cold.value_at(c, *t));
        }
    }
}

#[test]
fn stepping_and_jumping_agree_with_cold_lookups() {
    let mut rng = StdRng::seed_from_u64(0x5ce9a710);

    let mut scenario = String::new();
    let mut time = 0.0;
    for _ in 0..200 {
        time += rng.random_range(0.0..0.5);
        let a: f64 = rng.random_range(-1.0..1.0);
        let b = if rng.random_bool(0.3) {
            String::new()
        } else {
            rng.random_range(-1.0f64..1.0).to_string()
        };
        scenario.push_str(&format!("[{time};{a};{b};{a}]"));
    }
    let series = parse(&scenario, "[;L;ZOH;NN]", 1000).series;
    let end = time;

    let mut warm = Signals::new(series.clone());
    let mut t = -1.0;
    for step in 0..5000 {
        t += 0.013;
        if step % 97 == 0 {
            t = rng.random_range(-1.0..end + 1.0);
        }
        for c in 0..3 {
            let expected = Signals::new(series.clone()).value_at(c, t);
            assert_eq!(warm.value_at(c, t), expected, "column {c} at {t}");
        }
    }
}
