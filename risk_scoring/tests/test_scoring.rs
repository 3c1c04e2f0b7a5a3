use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use risk_scoring::utils::generate_observations;
use risk_scoring::{
    AnomalyEvidence, AnomalyScorer, DensityAnomalyScorer, Observation, RiskClassifier, RiskLevel,
    Severity, ZScoreAnomalyScorer,
};

fn history() -> Vec<Observation> {
    generate_observations(500, 42).unwrap()
}

fn calm() -> Observation {
    Observation::new(500.0, 1000.0, 2.0, 24.0, 650.0)
}

fn extreme() -> Observation {
    Observation::new(2500.0, 50.0, 30.0, 80.0, 0.0)
}

#[test]
fn test_density_scorer_separates_outliers() {
    let scorer = DensityAnomalyScorer::train(&history(), 42).unwrap();

    let normal = scorer.score(&calm()).unwrap();
    let outlier = scorer.score(&extreme()).unwrap();

    assert!(!normal.is_anomaly);
    assert!(outlier.is_anomaly);
    assert!(outlier.score < normal.score);
    assert!(outlier.severity >= normal.severity);
    match outlier.evidence {
        Some(AnomalyEvidence::Density { decision }) => assert!(decision < 0.0),
        other => panic!("unexpected evidence {:?}", other),
    }
}

#[test]
fn test_density_scorer_is_deterministic() {
    let first = DensityAnomalyScorer::train(&history(), 42).unwrap();
    let second = DensityAnomalyScorer::train(&history(), 42).unwrap();
    assert_eq!(first, second);

    let observation = extreme();
    assert_eq!(
        first.score(&observation).unwrap(),
        first.score(&observation).unwrap()
    );
}

#[test]
fn test_density_scorer_survives_a_round_trip() {
    let scorer = DensityAnomalyScorer::train(&history(), 7).unwrap();
    let json = serde_json::to_string(&scorer).unwrap();
    let restored: DensityAnomalyScorer = serde_json::from_str(&json).unwrap();

    let observation = calm();
    assert_relative_eq!(
        scorer.score(&observation).unwrap().score,
        restored.score(&observation).unwrap().score,
        epsilon = 1e-9
    );
}

#[test]
fn test_scorers_behind_one_trait() {
    let density = DensityAnomalyScorer::train(&history(), 42).unwrap();
    let zscore = ZScoreAnomalyScorer::default();
    let scorers: Vec<Box<dyn AnomalyScorer>> = vec![Box::new(density), Box::new(zscore)];

    for scorer in &scorers {
        let result = scorer.score_or_fallback(&extreme());
        assert!(result.is_anomaly, "{}", scorer.name());
        assert!(!result.is_fallback());
    }

    let hot = scorers[1].score(&extreme()).unwrap();
    assert_eq!(hot.severity, Some(Severity::High));
}

#[test]
fn test_risk_classifier_ranks_troubled_shipments_higher() {
    let (classifier, accuracy) = RiskClassifier::train(&history(), 42).unwrap();
    assert!(accuracy > 0.6, "accuracy {}", accuracy);

    let troubled = Observation::new(500.0, 0.0, 5.0, 35.0, 200.0);
    let risky = classifier.assess(&troubled).unwrap();
    let safe = classifier.assess(&Observation::new(500.0, 0.0, 1.0, 22.0, 800.0)).unwrap();

    assert!(risky.risk_probability > safe.risk_probability);
    assert_eq!(risky.top_factors.len(), 3);
    assert!(risky.confidence >= 0.5 && risky.confidence <= 1.0);
    assert_eq!(risky.risk_level, RiskLevel::from_probability(risky.risk_probability));
}

#[test]
fn test_risk_classifier_is_deterministic() {
    let (first, first_accuracy) = RiskClassifier::train(&history(), 42).unwrap();
    let (second, second_accuracy) = RiskClassifier::train(&history(), 42).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_accuracy, second_accuracy);
    assert_eq!(
        first.assess(&calm()).unwrap(),
        second.assess(&calm()).unwrap()
    );
}
