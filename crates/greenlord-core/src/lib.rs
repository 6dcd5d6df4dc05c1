pub mod catalog;
pub mod eligibility;
pub mod error;
pub mod inputs;
pub mod model;
pub mod postcode;

use catalog::SchemeCatalog;
use chrono::NaiveDate;
use eligibility::aggregate::ResultContext;
use eligibility::{EvaluationContext, GrantEligibilityResult, PropertyLocation};
use error::GrantError;
use model::GrantEligibilityInputs;
use postcode::{AuthorityLookup, StaticPostcodeResolver};
use tracing::{info, warn};

/// A scheme catalog paired with the postcode tables it is evaluated against.
///
/// Both are read-only, so one engine can serve any number of evaluations.
pub struct GrantEngine<L: AuthorityLookup = StaticPostcodeResolver> {
    catalog: SchemeCatalog,
    lookup: L,
}

impl GrantEngine<StaticPostcodeResolver> {
    /// The compiled-in catalog and postcode tables.
    pub fn builtin() -> Result<Self, GrantError> {
        Self::new(SchemeCatalog::builtin()?, StaticPostcodeResolver::builtin()?)
    }
}

impl<L: AuthorityLookup> GrantEngine<L> {
    /// Pair a catalog with a lookup, rejecting schemes that name unknown councils.
    pub fn new(catalog: SchemeCatalog, lookup: L) -> Result<Self, GrantError> {
        catalog.check_authorities(&lookup)?;
        Ok(Self { catalog, lookup })
    }

    pub fn catalog(&self) -> &SchemeCatalog {
        &self.catalog
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Evaluate against today's date.
    pub fn evaluate(
        &self,
        inputs: &GrantEligibilityInputs,
    ) -> Result<GrantEligibilityResult, GrantError> {
        self.evaluate_as_of(inputs, chrono::Local::now().date_naive())
    }

    /// Evaluate every scheme in the catalog as of `as_of`.
    ///
    /// Fails only if the postcode is malformed; an unmapped postcode still
    /// produces a full result.
    pub fn evaluate_as_of(
        &self,
        inputs: &GrantEligibilityInputs,
        as_of: NaiveDate,
    ) -> Result<GrantEligibilityResult, GrantError> {
        let postcode = inputs.postcode()?;
        let location = PropertyLocation::resolve(postcode, &self.lookup);
        if !location.is_resolved() {
            warn!(
                postcode = %location.postcode,
                region = ?location.region,
                "postcode did not resolve to a local authority"
            );
        }

        let mut normalized = inputs.clone();
        normalized.postcode = location.postcode.to_string();

        let ctx = EvaluationContext {
            inputs: &normalized,
            location: &location,
            lookup: &self.lookup,
            as_of,
        };
        let matches = self
            .catalog
            .schemes()
            .iter()
            .map(|scheme| eligibility::evaluate_scheme(scheme, &ctx))
            .collect();

        let result = eligibility::aggregate(
            matches,
            ResultContext {
                inputs: normalized,
                local_authority: location.local_authority,
                region: location.region,
                as_of,
                catalog_version: self.catalog.version(),
            },
        );

        info!(
            postcode = %location.postcode,
            eligible = result.eligible_grants.len(),
            ineligible = result.ineligible_grants.len(),
            total = %result.total_potential_value,
            "eligibility evaluated"
        );
        Ok(result)
    }
}

/// Main API entry point: evaluate the inputs against the built-in catalog.
pub fn evaluate(inputs: &GrantEligibilityInputs) -> Result<GrantEligibilityResult, GrantError> {
    GrantEngine::builtin()?.evaluate(inputs)
}
