//! Cross-field validation of parsed options
//!
//! Rules run in a fixed order and the first failure aborts the run, so a
//! given option combination always reports the same message.

use crate::{
    config::DriverOptions,
    core::recommender::Capabilities,
    error::{DriverError, Result},
};
use serde::Serialize;
use tracing::{debug, instrument};

/// Identifies which validation rule rejected the options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationRule {
    SingleFold,
    CrossValidationWithTestRatio,
    CrossValidationWithPredictionFile,
    CrossValidationWithSaveModel,
    CrossValidationWithLoadModel,
    MissingUserAttributes,
    MissingItemAttributes,
    MissingUserRelations,
    MissingItemRelations,
    NoIdMappingWithSaveUserMapping,
    NoIdMappingWithSaveItemMapping,
    NoIdMappingWithLoadUserMapping,
    NoIdMappingWithLoadItemMapping,
}

/// Check every rule in order; `leftovers` are unclaimed positional arguments
#[instrument(skip_all)]
pub fn validate(
    options: &DriverOptions,
    capabilities: Capabilities,
    leftovers: &[String],
    usage: &str,
) -> Result<()> {
    check_cross_validation(options)?;
    check_capabilities(options, capabilities)?;
    check_id_mapping(options)?;

    if let Some(argument) = leftovers.first() {
        return Err(DriverError::unexpected_argument(argument.clone(), usage));
    }

    debug!("Options passed validation");
    Ok(())
}

fn check_cross_validation(options: &DriverOptions) -> Result<()> {
    let folds = options.evaluation.cross_validation;
    if folds == 1 {
        return Err(DriverError::validation(
            ValidationRule::SingleFold,
            "--cross-validation=1 is not allowed; K must be 0 (disabled) or at least 2",
        ));
    }
    if folds < 2 {
        return Ok(());
    }

    if options.evaluation.test_ratio != 0.0 {
        return Err(DriverError::validation(
            ValidationRule::CrossValidationWithTestRatio,
            format!(
                "--cross-validation={folds} and --test-ratio={} are mutually exclusive",
                options.evaluation.test_ratio
            ),
        ));
    }

    let files = &options.files;
    let exclusive = [
        (
            files.prediction_file.is_some(),
            ValidationRule::CrossValidationWithPredictionFile,
            "--prediction-file=FILE",
        ),
        (
            files.save_model.is_some(),
            ValidationRule::CrossValidationWithSaveModel,
            "--save-model=FILE",
        ),
        (
            files.load_model.is_some(),
            ValidationRule::CrossValidationWithLoadModel,
            "--load-model=FILE",
        ),
    ];

    for (set, rule, flag) in exclusive {
        if set {
            return Err(DriverError::validation(
                rule,
                format!("--cross-validation={folds} and {flag} are mutually exclusive"),
            ));
        }
    }

    Ok(())
}

fn check_capabilities(options: &DriverOptions, capabilities: Capabilities) -> Result<()> {
    let files = &options.files;
    let required = [
        (
            capabilities.user_attributes,
            files.user_attributes.is_some(),
            ValidationRule::MissingUserAttributes,
            "--user-attributes=FILE",
        ),
        (
            capabilities.item_attributes,
            files.item_attributes.is_some(),
            ValidationRule::MissingItemAttributes,
            "--item-attributes=FILE",
        ),
        (
            capabilities.user_relations,
            files.user_relations.is_some(),
            ValidationRule::MissingUserRelations,
            "--user-relations=FILE",
        ),
        (
            capabilities.item_relations,
            files.item_relations.is_some(),
            ValidationRule::MissingItemRelations,
            "--item-relations=FILE",
        ),
    ];

    for (needed, given, rule, flag) in required {
        if needed && !given {
            return Err(DriverError::validation(
                rule,
                format!("Recommender expects {flag}"),
            ));
        }
    }

    Ok(())
}

fn check_id_mapping(options: &DriverOptions) -> Result<()> {
    if !options.evaluation.no_id_mapping {
        return Ok(());
    }

    let files = &options.files;
    let conflicting = [
        (
            files.save_user_mapping.is_some(),
            ValidationRule::NoIdMappingWithSaveUserMapping,
            "--save-user-mapping=FILE",
        ),
        (
            files.save_item_mapping.is_some(),
            ValidationRule::NoIdMappingWithSaveItemMapping,
            "--save-item-mapping=FILE",
        ),
        (
            files.load_user_mapping.is_some(),
            ValidationRule::NoIdMappingWithLoadUserMapping,
            "--load-user-mapping=FILE",
        ),
        (
            files.load_item_mapping.is_some(),
            ValidationRule::NoIdMappingWithLoadItemMapping,
            "--load-item-mapping=FILE",
        ),
    ];

    for (set, rule, flag) in conflicting {
        if set {
            return Err(DriverError::validation(
                rule,
                format!("--no-id-mapping and {flag} are mutually exclusive"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(options: &DriverOptions) -> Result<()> {
        validate(options, Capabilities::NONE, &[], "usage")
    }

    fn rule_of(options: &DriverOptions) -> Option<ValidationRule> {
        check(options).unwrap_err().rule()
    }

    fn with_folds(folds: u32) -> DriverOptions {
        let mut options = DriverOptions::default();
        options.evaluation.cross_validation = folds;
        options
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(check(&DriverOptions::default()).is_ok());
    }

    #[test]
    fn test_single_fold_is_rejected() {
        let err = check(&with_folds(1)).unwrap_err();
        assert_eq!(err.rule(), Some(ValidationRule::SingleFold));
        assert!(err.to_string().contains("--cross-validation=1"));
    }

    #[test]
    fn test_disabled_and_multi_fold_are_accepted() {
        assert!(check(&with_folds(0)).is_ok());
        assert!(check(&with_folds(2)).is_ok());
        assert!(check(&with_folds(10)).is_ok());
    }

    #[test]
    fn test_cross_validation_exclusions() {
        let mut options = with_folds(5);
        options.evaluation.test_ratio = 0.1;
        assert_eq!(
            rule_of(&options),
            Some(ValidationRule::CrossValidationWithTestRatio)
        );

        let mut options = with_folds(5);
        options.files.prediction_file = Some("pred.txt".to_string());
        assert_eq!(
            rule_of(&options),
            Some(ValidationRule::CrossValidationWithPredictionFile)
        );

        let mut options = with_folds(5);
        options.files.save_model = Some("model.bin".to_string());
        assert_eq!(
            rule_of(&options),
            Some(ValidationRule::CrossValidationWithSaveModel)
        );

        let mut options = with_folds(5);
        options.files.load_model = Some("model.bin".to_string());
        assert_eq!(
            rule_of(&options),
            Some(ValidationRule::CrossValidationWithLoadModel)
        );
    }

    #[test]
    fn test_exclusions_ignore_disabled_cross_validation() {
        let mut options = with_folds(0);
        options.evaluation.test_ratio = 0.1;
        options.files.prediction_file = Some("pred.txt".to_string());
        options.files.save_model = Some("model.bin".to_string());
        options.files.load_model = Some("model.bin".to_string());
        assert!(check(&options).is_ok());
    }

    #[test]
    fn test_first_violated_rule_is_reported() {
        let mut options = with_folds(3);
        options.evaluation.test_ratio = 0.2;
        options.files.prediction_file = Some("pred.txt".to_string());
        options.files.save_model = Some("model.bin".to_string());
        options.files.load_model = Some("model.bin".to_string());
        assert_eq!(
            rule_of(&options),
            Some(ValidationRule::CrossValidationWithTestRatio)
        );

        options.evaluation.test_ratio = 0.0;
        assert_eq!(
            rule_of(&options),
            Some(ValidationRule::CrossValidationWithPredictionFile)
        );

        options.files.prediction_file = None;
        assert_eq!(
            rule_of(&options),
            Some(ValidationRule::CrossValidationWithSaveModel)
        );

        options.files.save_model = None;
        assert_eq!(
            rule_of(&options),
            Some(ValidationRule::CrossValidationWithLoadModel)
        );
    }

    #[test]
    fn test_single_fold_wins_over_later_rules() {
        let mut options = with_folds(1);
        options.evaluation.no_id_mapping = true;
        options.files.save_user_mapping = Some("users.map".to_string());
        let err = validate(&options, Capabilities::NONE, &["foo".to_string()], "usage")
            .unwrap_err();
        assert_eq!(err.rule(), Some(ValidationRule::SingleFold));
    }

    #[test]
    fn test_capability_requirements() {
        let cases = [
            (
                Capabilities::NONE.with_user_attributes(),
                ValidationRule::MissingUserAttributes,
                "--user-attributes",
            ),
            (
                Capabilities::NONE.with_item_attributes(),
                ValidationRule::MissingItemAttributes,
                "--item-attributes",
            ),
            (
                Capabilities::NONE.with_user_relations(),
                ValidationRule::MissingUserRelations,
                "--user-relations",
            ),
            (
                Capabilities::NONE.with_item_relations(),
                ValidationRule::MissingItemRelations,
                "--item-relations",
            ),
        ];

        for (capabilities, rule, flag) in cases {
            let err = validate(&DriverOptions::default(), capabilities, &[], "usage")
                .unwrap_err();
            assert_eq!(err.rule(), Some(rule));
            assert!(err.to_string().contains(flag), "{err} should name {flag}");
        }
    }

    #[test]
    fn test_capability_requirements_satisfied() {
        let mut options = DriverOptions::default();
        options.files.user_attributes = Some("ua.txt".to_string());
        options.files.item_attributes = Some("ia.txt".to_string());
        options.files.user_relations = Some("ur.txt".to_string());
        options.files.item_relations = Some("ir.txt".to_string());

        let all = Capabilities::NONE
            .with_user_attributes()
            .with_item_attributes()
            .with_user_relations()
            .with_item_relations();
        assert!(validate(&options, all, &[], "usage").is_ok());
    }

    #[test]
    fn test_no_id_mapping_conflicts() {
        let setters: [(fn(&mut DriverOptions), ValidationRule, &str); 4] = [
            (
                |o| o.files.save_user_mapping = Some("u".to_string()),
                ValidationRule::NoIdMappingWithSaveUserMapping,
                "--save-user-mapping",
            ),
            (
                |o| o.files.save_item_mapping = Some("i".to_string()),
                ValidationRule::NoIdMappingWithSaveItemMapping,
                "--save-item-mapping",
            ),
            (
                |o| o.files.load_user_mapping = Some("u".to_string()),
                ValidationRule::NoIdMappingWithLoadUserMapping,
                "--load-user-mapping",
            ),
            (
                |o| o.files.load_item_mapping = Some("i".to_string()),
                ValidationRule::NoIdMappingWithLoadItemMapping,
                "--load-item-mapping",
            ),
        ];

        for (set, rule, flag) in setters {
            let mut options = DriverOptions::default();
            set(&mut options);
            assert!(check(&options).is_ok(), "{flag} alone should validate");

            options.evaluation.no_id_mapping = true;
            let err = check(&options).unwrap_err();
            assert_eq!(err.rule(), Some(rule));
            assert!(err.to_string().contains("--no-id-mapping"));
            assert!(err.to_string().contains(flag));
        }
    }

    #[test]
    fn test_no_id_mapping_alone_is_valid() {
        let mut options = DriverOptions::default();
        options.evaluation.no_id_mapping = true;
        assert!(check(&options).is_ok());
    }

    #[test]
    fn test_leftover_argument_is_reported_first() {
        let leftovers = vec!["foo".to_string(), "bar".to_string()];
        let err = validate(&DriverOptions::default(), Capabilities::NONE, &leftovers, "Usage: x")
            .unwrap_err();
        match err {
            DriverError::UnexpectedArgument { argument, usage } => {
                assert_eq!(argument, "foo");
                assert_eq!(usage, "Usage: x");
            }
            other => panic!("Expected UnexpectedArgument, got {other:?}"),
        }
    }
}
