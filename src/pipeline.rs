//! End-to-end orchestration
//!
//! store → features → walk-forward CV → final model → predictions → outputs.
//! Nothing is written until every computation of the run has succeeded. Outputs
//! are staged first; the predictions transaction is the first commit, so a
//! failure up to and including it leaves the previous model, predictions and
//! dashboard in place.

use log::{info, warn};
use std::path::Path;

use crate::data::{MatchStore, StandingsTable, TeamAliases};
use crate::features::{FeatureBuilder, FeatureSpec, FeatureTable};
use crate::model::artifact::{self, ArtifactMetadata, StagedArtifact};
use crate::predict::inference::{predict_rows, predict_upcoming, Prediction};
use crate::predict::report::{Dashboard, KpiSummary};
use crate::training::final_trainer::train_final;
use crate::training::folds::generate_folds;
use crate::training::labels::LabelEncoder;
use crate::training::mlp::MlpClassifier;
use crate::training::walk_forward::{self, CvSummary};
use crate::{Config, KickoffError, Result, TrainBackend};

/// Outcome of a full run
#[derive(Debug)]
pub struct RunSummary {
    pub cv: CvSummary,
    pub kpis: KpiSummary,
    pub training_rows: usize,
    pub predictions: Vec<Prediction>,
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn open_store(&self) -> Result<MatchStore> {
        MatchStore::open(&self.config.data.database_path)
    }

    fn spec(&self) -> Result<FeatureSpec> {
        FeatureSpec::from_config(&self.config.features)
    }

    fn classifier(&self) -> MlpClassifier<TrainBackend> {
        MlpClassifier::new(
            self.config.model.clone(),
            self.config.validation.early_stopping_patience,
            Default::default(),
        )
    }

    /// Read the store and standings file and derive the feature table
    pub fn build_features(&self) -> Result<FeatureTable> {
        let store = self.open_store()?;
        self.build_features_from(&store)
    }

    fn build_features_from(&self, store: &MatchStore) -> Result<FeatureTable> {
        let matches = store.load_matches()?;
        let stats = store.load_statistics()?;
        info!(
            "Loaded {} matches and {} statistics rows",
            matches.len(),
            stats.len()
        );

        let aliases = TeamAliases::new(self.config.features.team_aliases.clone());
        let standings = StandingsTable::load_optional(&self.config.data.standings_path, &aliases);
        let builder = FeatureBuilder::new(self.config.features.clone(), standings);
        Ok(builder.build(&matches, &stats))
    }

    /// Walk-forward cross-validation anchored at the latest completed fixture
    pub fn evaluate(&self, table: &FeatureTable) -> Result<CvSummary> {
        let anchor = table
            .latest_played_date()
            .ok_or(KickoffError::EmptyTrainingSet)?;
        let encoder = LabelEncoder::fit(table.train.iter().filter_map(|r| r.target));
        let validation = &self.config.validation;
        let folds = generate_folds(
            anchor,
            validation.fold_count,
            validation.validation_span_days,
            validation.gap_days,
        );
        walk_forward::evaluate(&self.classifier(), &table.train, &self.spec()?, &encoder, &folds)
    }

    /// Fit the production model on every completed fixture and persist it
    pub fn train(&self, table: &FeatureTable) -> Result<ArtifactMetadata> {
        let spec = self.spec()?;
        let encoder = LabelEncoder::fit(table.train.iter().filter_map(|r| r.target));
        let trained = train_final(&self.classifier(), &table.train, &spec, &encoder)?;
        let metadata = ArtifactMetadata::new(
            &trained.model,
            encoder.labels().to_vec(),
            spec.names(),
            trained.training_rows,
        );
        artifact::save(&self.config.data.model_dir, &trained.model, &metadata)?;
        Ok(metadata)
    }

    /// Predict upcoming fixtures with the persisted model and publish them.
    /// KPIs of the previous dashboard are kept.
    pub fn predict(&self) -> Result<Vec<Prediction>> {
        let mut store = self.open_store()?;
        let table = self.build_features_from(&store)?;
        let predictions =
            predict_upcoming(&self.config.data.model_dir, &self.config.features, &table.predict)?;
        if predictions.is_empty() {
            return Ok(predictions);
        }

        let dashboard_path = Path::new(&self.config.data.dashboard_path);
        let kpis = match Dashboard::read(dashboard_path) {
            Ok(previous) => previous.kpis,
            Err(_) => KpiSummary::new(
                &CvSummary::default(),
                table.train.len(),
                chrono::Local::now().naive_local(),
            ),
        };
        self.publish(&mut store, None, &predictions, kpis)?;
        Ok(predictions)
    }

    /// Stage the dashboard, replace the stored predictions, then move the
    /// staged model and dashboard into place.
    fn publish(
        &self,
        store: &mut MatchStore,
        model: Option<StagedArtifact>,
        predictions: &[Prediction],
        kpis: KpiSummary,
    ) -> Result<()> {
        let dashboard =
            Dashboard::new(kpis, predictions).stage(&self.config.data.dashboard_path)?;
        store.replace_predictions(predictions)?;
        if let Some(model) = model {
            model.commit()?;
        }
        dashboard.commit()
    }

    /// Full pipeline run
    pub fn run(&self) -> Result<RunSummary> {
        let mut store = self.open_store()?;
        let table = self.build_features_from(&store)?;
        if table.train.is_empty() {
            return Err(KickoffError::EmptyTrainingSet);
        }

        let cv = self.evaluate(&table)?;

        let spec = self.spec()?;
        let encoder = LabelEncoder::fit(table.train.iter().filter_map(|r| r.target));
        let trained = train_final(&self.classifier(), &table.train, &spec, &encoder)?;
        let now = chrono::Local::now().naive_local();
        let predictions = predict_rows(&trained.model, &table.predict, &spec, &encoder, now)?;
        if predictions.is_empty() {
            warn!("No upcoming fixtures to predict");
        }
        let kpis = KpiSummary::new(&cv, trained.training_rows, now);

        // outputs
        let metadata = ArtifactMetadata::new(
            &trained.model,
            encoder.labels().to_vec(),
            spec.names(),
            trained.training_rows,
        );
        let staged = artifact::stage(&self.config.data.model_dir, &trained.model, &metadata)?;
        self.publish(&mut store, Some(staged), &predictions, kpis.clone())?;

        info!(
            "Run complete: accuracy {}, F1 {}, {} predictions",
            kpis.accuracy,
            kpis.f1,
            predictions.len()
        );
        Ok(RunSummary {
            cv,
            kpis,
            training_rows: trained.training_rows,
            predictions,
        })
    }
}
