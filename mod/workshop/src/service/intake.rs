//! Operation intake. Validates the submission per flow, resolves the
//! recommended spec, runs the comparison and decides whether the entry
//! is recorded or bounced back for a mismatch reason.

use motorlog_core::{Actor, new_id, now_rfc3339};
use serde::Serialize;

use crate::model::{
    Mismatch, OilSpec, Operation, OperationType, SubmitOperation,
};
use crate::service::{WorkshopError, WorkshopService, compare};

/// What came back from a submission.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmitOutcome {
    /// The operation was persisted.
    #[serde(rename_all = "camelCase")]
    Recorded { operation: Operation },
    /// The entry mismatches the recommendation and no reason was
    /// supplied. Nothing was persisted.
    #[serde(rename_all = "camelCase")]
    NeedsReason {
        mismatches: Vec<Mismatch>,
        recommended: OilSpec,
    },
}

fn missing_fields_error(labels: Vec<&str>) -> WorkshopError {
    WorkshopError::Validation(format!("البيانات التالية مطلوبة: {}", labels.join("، ")))
}

fn validate_submission(input: &SubmitOperation) -> Result<(), WorkshopError> {
    let mut missing = Vec::new();

    if input.car_brand.trim().is_empty() {
        missing.push("نوع العربية");
    }
    if input.car_model.trim().is_empty() {
        missing.push("الموديل");
    }
    if input.car_year.is_none() {
        missing.push("سنة الصنع");
    }
    if input.engine_size.trim().is_empty() {
        missing.push("حجم المحرك");
    }

    if input.operation_type == OperationType::Service {
        if input.oil_used.as_deref().unwrap_or("").trim().is_empty() {
            missing.push("نوع الزيت");
        }
        if input
            .oil_viscosity
            .as_deref()
            .unwrap_or("")
            .trim()
            .is_empty()
        {
            missing.push("اللزوجة");
        }
        if input.oil_quantity.is_none() {
            missing.push("الكمية");
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing_fields_error(missing))
    }
}

impl WorkshopService {
    /// Handle an intake submission. See [`SubmitOutcome`].
    pub fn submit_operation(
        &self,
        input: SubmitOperation,
        actor: Option<&Actor>,
    ) -> Result<SubmitOutcome, WorkshopError> {
        validate_submission(&input)?;

        let year = input.car_year.unwrap_or_default();
        let resolved = self.resolve_spec(
            &input.car_brand,
            &input.car_model,
            year,
            Some(&input.engine_size),
        )?;

        match input.operation_type {
            OperationType::Inquiry => {
                // An inquiry only makes sense against a known car.
                let car = resolved.ok_or_else(|| {
                    WorkshopError::NotFound(
                        "لا توجد بيانات لهذه السيارة في قاعدة البيانات".into(),
                    )
                })?;

                // Record the recommendation itself; inquiries always match.
                let op = self.persist_operation(&input, actor, &car.spec(), true, None)?;
                Ok(SubmitOutcome::Recorded { operation: op })
            }

            OperationType::Service => {
                let entered = OilSpec {
                    oil_type: input.oil_used.clone().unwrap_or_default(),
                    oil_viscosity: input.oil_viscosity.clone().unwrap_or_default(),
                    oil_quantity: input.oil_quantity.unwrap_or_default(),
                };

                let Some(car) = resolved else {
                    // No reference row to disagree with.
                    let op = self.persist_operation(&input, actor, &entered, true, None)?;
                    return Ok(SubmitOutcome::Recorded { operation: op });
                };

                let result = compare::check_match(&entered, &car.spec());

                if result.is_matching {
                    let op = self.persist_operation(&input, actor, &entered, true, None)?;
                    return Ok(SubmitOutcome::Recorded { operation: op });
                }

                let reason = input
                    .mismatch_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string);

                match reason {
                    Some(reason) => {
                        let op =
                            self.persist_operation(&input, actor, &entered, false, Some(reason))?;
                        Ok(SubmitOutcome::Recorded { operation: op })
                    }
                    None => Ok(SubmitOutcome::NeedsReason {
                        mismatches: result.mismatches,
                        recommended: car.spec(),
                    }),
                }
            }
        }
    }

    fn persist_operation(
        &self,
        input: &SubmitOperation,
        actor: Option<&Actor>,
        oil: &OilSpec,
        is_matching: bool,
        mismatch_reason: Option<String>,
    ) -> Result<Operation, WorkshopError> {
        let op = Operation {
            id: new_id(),
            car_brand: input.car_brand.trim().to_string(),
            car_model: input.car_model.trim().to_string(),
            car_year: input.car_year.unwrap_or_default(),
            engine_size: input.engine_size.trim().to_string(),
            oil_used: oil.oil_type.trim().to_string(),
            oil_viscosity: oil.oil_viscosity.trim().to_string(),
            oil_quantity: oil.oil_quantity,
            oil_filter: input.oil_filter,
            air_filter: input.air_filter,
            cooling_filter: input.cooling_filter,
            is_matching,
            mismatch_reason,
            operation_type: input.operation_type,
            user_id: actor.map(|a| a.user_id.clone()),
            branch_id: actor.and_then(|a| a.branch_id.clone()),
            created_at: now_rfc3339(),
        };

        self.insert_operation(&op)?;
        Ok(op)
    }
}
