use super::pyproject::{ParseError, ProjectParser};
use super::{CPYTHON, PIP, POETRY, PYPROJECT};
use crate::cnb::{
    BuildPlan, BuildPlanMetadata, BuildPlanProvision, BuildPlanRequirement, DetectContext,
    DetectOutcome, Detector,
};
use tracing::{debug, info};

pub struct PoetryDetector<P> {
    parser: P,
}

impl<P: ProjectParser> PoetryDetector<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }
}

impl<P: ProjectParser> Detector for PoetryDetector<P> {
    type Error = ParseError;

    fn detect(&self, context: &DetectContext) -> Result<DetectOutcome, ParseError> {
        let manifest = self.parser.parse(&context.working_dir)?;

        if !manifest.detected {
            info!(dir = %context.working_dir.display(), "No Poetry project found");
            return Ok(DetectOutcome::Fail);
        }

        let mut cpython = BuildPlanMetadata {
            build: true,
            ..Default::default()
        };
        if !manifest.python_version.is_empty() {
            debug!(version = %manifest.python_version, "Python version pinned in {}", PYPROJECT);
            cpython.version = Some(manifest.python_version);
            cpython.version_source = Some(PYPROJECT.to_string());
        }

        Ok(DetectOutcome::Pass(BuildPlan {
            provides: vec![BuildPlanProvision::new(POETRY)],
            requires: vec![
                BuildPlanRequirement {
                    name: CPYTHON.to_string(),
                    metadata: cpython,
                },
                BuildPlanRequirement {
                    name: PIP.to_string(),
                    metadata: BuildPlanMetadata {
                        build: true,
                        ..Default::default()
                    },
                },
            ],
        }))
    }
}
