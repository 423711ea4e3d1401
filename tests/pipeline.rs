use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tennis_predictor::history::{HeadToHeadTable, PlayerHistories};
use tennis_predictor::schema::{
    H2H, METADATA, MINUTES, P1_ATTRS, P1_FORM, P1_SERVE, P2_ATTRS, P2_FORM, P2_SERVE, SCORE,
};
use tennis_predictor::{
    ChronologicalProcessor, DatasetAssembler, MatchRecord, PipelineConfig, PlayerEntry,
};

fn player(id: &str, country: &str, height: i32) -> PlayerEntry {
    PlayerEntry {
        country: Some(country.to_string()),
        height: Some(height),
        ..PlayerEntry::new(id)
    }
}

fn played(
    date: i32,
    num: i32,
    surface: &str,
    winner: PlayerEntry,
    loser: PlayerEntry,
    score: &str,
) -> MatchRecord {
    let mut m = MatchRecord::new(winner, loser);
    m.tourney_id = Some(format!("T{date}"));
    m.tourney_date = Some(date);
    m.match_num = Some(num);
    m.surface = Some(surface.to_string());
    m.score = Some(score.to_string());
    m.best_of = Some(3);
    m
}

fn synthetic_log(n: usize, players: usize, seed: u64) -> Vec<MatchRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let surfaces = ["Hard", "Clay", "Grass"];
    let countries = ["SRB", "ESP", "ITA", "USA", "GER"];
    (0..n)
        .map(|i| {
            let w = rng.gen_range(0..players);
            let mut l = rng.gen_range(0..players);
            if l == w {
                l = (w + 1) % players;
            }
            let mut m = played(
                20200101 + (i as i32 / 30) * 100,
                i as i32,
                surfaces[rng.gen_range(0..surfaces.len())],
                player(&format!("p{w}"), countries[w % countries.len()], 180 + w as i32),
                player(&format!("p{l}"), countries[l % countries.len()], 180 + l as i32),
                "6-3 4-6 7-6(4)",
            );
            m.minutes = rng.gen_bool(0.8).then(|| rng.gen_range(60..240));
            m.winner_serve.aces = Some(rng.gen_range(0..20));
            m.loser_serve.aces = rng.gen_bool(0.9).then(|| rng.gen_range(0..20));
            m
        })
        .collect()
}

#[test]
fn worked_example_uses_only_prior_matches() {
    let a = player("A", "SRB", 188);
    let b = player("B", "ESP", 183);
    let c = player("C", "SUI", 185);
    let log = vec![
        played(20240101, 1, "Hard", a, b.clone(), "6-4 6-3"),
        played(20240108, 1, "Clay", b, c, "7-6(3) 6-2"),
    ];

    let mut processor = ChronologicalProcessor::new(PipelineConfig::default());
    let rows = processor.process(&log).expect("rows");
    assert_eq!(rows.len(), 4);

    assert_eq!(rows[0].values[H2H], Some(0.5));
    assert_eq!(rows[0].values[P1_FORM], Some(0.5));
    assert_eq!(rows[0].get("p1_surface_elo"), Some(1500.0));

    assert_eq!(
        processor.head_to_head().win_rate(Some("A"), Some("B")),
        1.0
    );
    assert_eq!(processor.head_to_head().wins("A", "B"), 1);
    assert_eq!(processor.head_to_head().wins("B", "A"), 0);
    assert_eq!(rows[2].values[P1_FORM], Some(0.0));
    assert_eq!(rows[2].values[H2H], Some(0.5));
    assert_eq!(rows[2].get("p1_surface_elo"), Some(1500.0));
    assert_eq!(rows[3].values[P2_FORM], Some(0.0));

    assert_eq!(processor.histories().surface_rating("A", Some("Hard")), 1510.0);
    assert_eq!(processor.histories().surface_rating("B", Some("Hard")), 1490.0);
    assert_eq!(processor.histories().surface_rating("B", Some("Clay")), 1510.0);
}

#[test]
fn paired_rows_are_role_swaps() {
    let log = synthetic_log(300, 12, 7);
    let mut processor = ChronologicalProcessor::new(PipelineConfig::default());
    let rows = processor.process(&log).expect("rows");
    assert_eq!(rows.len(), log.len() * 2);

    for pair in rows.chunks(2) {
        let (w, l) = (&pair[0], &pair[1]);
        assert_eq!((w.label, l.label), (1, 0));
        assert_eq!(w.values[METADATA], l.values[METADATA]);
        assert_eq!(w.values[MINUTES], l.values[MINUTES]);
        assert_eq!(w.values[SCORE], l.values[SCORE]);
        assert_eq!(w.values[P1_ATTRS], l.values[P2_ATTRS]);
        assert_eq!(w.values[P2_ATTRS], l.values[P1_ATTRS]);
        assert_eq!(w.values[P1_SERVE], l.values[P2_SERVE]);
        assert_eq!(w.values[P2_SERVE], l.values[P1_SERVE]);
        assert_eq!(w.values[P1_FORM], l.values[P2_FORM]);
        assert_eq!(w.values[P2_FORM], l.values[P1_FORM]);

        let (Some(hw), Some(hl)) = (w.values[H2H], l.values[H2H]) else {
            panic!("h2h is never missing");
        };
        assert!((hw + hl - 1.0).abs() < 1e-6);
    }
}

#[test]
fn history_features_replay_from_earlier_matches() {
    let log = synthetic_log(200, 8, 11);
    let cfg = PipelineConfig::default();
    let mut processor = ChronologicalProcessor::new(cfg);
    let rows = processor.process(&log).expect("rows");

    let mut histories = PlayerHistories::new(cfg.history_cap, cfg.rating_rule);
    let mut h2h = HeadToHeadTable::default();
    for (k, m) in log.iter().enumerate() {
        let (w, l) = (m.winner.id.as_str(), m.loser.id.as_str());
        let row = &rows[2 * k];
        assert_eq!(row.values[H2H], Some(h2h.win_rate(Some(w), Some(l)) as f32));
        assert_eq!(
            row.values[P1_FORM],
            Some(histories.form_rate(w, cfg.form_window) as f32)
        );
        assert_eq!(
            row.values[P2_FORM],
            Some(histories.form_rate(l, cfg.form_window) as f32)
        );
        assert_eq!(
            row.get("p1_surface_elo"),
            Some(histories.surface_rating(w, m.surface.as_deref()) as f32)
        );
        histories.record_match(w, l, m.surface.as_deref());
        h2h.record_win(w, l);
    }
}

#[test]
fn form_stays_in_unit_interval_and_window_is_capped() {
    let log = synthetic_log(500, 4, 3);
    let cfg = PipelineConfig {
        history_cap: 5,
        form_window: 10,
        ..PipelineConfig::default()
    };
    let mut processor = ChronologicalProcessor::new(cfg);
    let rows = processor.process(&log).expect("rows");

    for row in &rows {
        for idx in [P1_FORM, P2_FORM] {
            let v = row.values[idx].expect("form is never missing");
            assert!((0.0..=1.0).contains(&v));
        }
    }
    for id in ["p0", "p1", "p2", "p3"] {
        let h = processor.histories().get(id).expect("player seen");
        assert_eq!(h.window_len(), 5);
        assert!(h.matches_total > 5);
    }
}

#[test]
fn rerunning_the_pipeline_is_deterministic() {
    let log = synthetic_log(250, 10, 5);
    let run = || {
        let mut processor = ChronologicalProcessor::new(PipelineConfig::default());
        let rows = processor.process(&log).expect("rows");
        let matrix = DatasetAssembler::default().assemble(&rows).expect("matrix");
        (rows, matrix)
    };
    let (rows_a, matrix_a) = run();
    let (rows_b, matrix_b) = run();
    assert_eq!(rows_a, rows_b);
    assert_eq!(matrix_a.values, matrix_b.values);
    assert_eq!(matrix_a.labels, matrix_b.labels);
    assert!(matrix_a.values.iter().all(|v| v.is_finite()));
    assert_eq!(matrix_a.positive_labels(), log.len());
}

#[test]
fn country_codes_follow_first_appearance_in_the_whole_log() {
    let log = vec![
        played(20240101, 1, "Hard", player("A", "SRB", 188), player("B", "ESP", 183), "6-4 6-3"),
        played(20240108, 1, "Hard", player("C", "ITA", 190), player("A", "SRB", 188), "6-4 6-3"),
    ];
    let mut processor = ChronologicalProcessor::new(PipelineConfig::default());
    let rows = processor.process(&log).expect("rows");
    assert_eq!(rows[0].get("p1_ioc_enc"), Some(0.0));
    assert_eq!(rows[0].get("p2_ioc_enc"), Some(1.0));
    assert_eq!(rows[2].get("p1_ioc_enc"), Some(2.0));
    assert_eq!(rows[2].get("p1_hand_enc"), Some(-1.0));
}
