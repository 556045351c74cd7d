// Timeline Query Service - lookups and aggregates over the stage catalog

use crate::catalog::StageCatalog;
use crate::entities::TimelineStage;

#[derive(Debug, Clone, Default)]
pub struct TimelineService {
    catalog: StageCatalog,
}

impl TimelineService {
    pub fn new(catalog: StageCatalog) -> Self {
        TimelineService { catalog }
    }

    /// Full catalog in its defined order
    pub fn list_stages(&self) -> &[TimelineStage] {
        &self.catalog.stages
    }

    /// Exact, case-sensitive match on `stage_name`
    pub fn get_stage(&self, name: &str) -> Option<&TimelineStage> {
        self.catalog.stages.iter().find(|s| s.stage_name == name)
    }

    pub fn average_days(&self, name: &str) -> Option<u32> {
        self.get_stage(name).map(|s| s.average_days)
    }

    /// Sum of `average_days` over the catalog
    pub fn total_expected_duration(&self) -> u64 {
        self.catalog
            .stages
            .iter()
            .map(|s| u64::from(s.average_days))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_stage_perm() {
        let service = TimelineService::default();
        let perm = service.get_stage("PERM").unwrap();

        assert_eq!(perm.average_days, 180);
        assert_eq!(perm.min_days, 150);
        assert_eq!(perm.max_days, 210);
    }

    #[test]
    fn test_get_stage_is_exact_match() {
        let service = TimelineService::default();

        assert!(service.get_stage("unknown").is_none());
        assert!(service.get_stage("perm").is_none());
        assert!(service.get_stage(" PERM").is_none());
    }

    #[test]
    fn test_total_expected_duration() {
        assert_eq!(TimelineService::default().total_expected_duration(), 660);
    }

    #[test]
    fn test_list_stages_and_average_days() {
        let service = TimelineService::default();

        assert_eq!(service.list_stages().len(), 4);
        assert_eq!(service.list_stages()[2].stage_name, "I-140");
        assert_eq!(service.average_days("I-140"), Some(120));
        assert_eq!(service.average_days("EB-5"), None);
    }
}
