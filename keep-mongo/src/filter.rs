//! Query constraints as MongoDB filter documents.

use bson::{doc, Bson, Document};
use keep_core::{KeepError, KeepResult, QueryConstraint, QueryOperator};

/// Field holding the record identifier.
pub const ID_FIELD: &str = "_id";

fn to_bson(value: &serde_json::Value) -> KeepResult<Bson> {
    bson::to_bson(value).map_err(|err| {
        KeepError::invalid_argument(format!("constraint value cannot be stored: {err}"))
            .with_source(err)
    })
}

/// One constraint as a single-field filter clause.
pub fn constraint_filter(constraint: &QueryConstraint) -> KeepResult<Document> {
    constraint.validate()?;
    let value = to_bson(&constraint.value)?;
    let condition = match constraint.operator {
        QueryOperator::Equal => doc! { "$eq": value },
        // Records without the field never match, same as the memory backend.
        QueryOperator::NotEqual => doc! { "$exists": true, "$ne": value },
        QueryOperator::LessThan => doc! { "$lt": value },
        QueryOperator::LessOrEqual => doc! { "$lte": value },
        QueryOperator::GreaterThan => doc! { "$gt": value },
        QueryOperator::GreaterOrEqual => doc! { "$gte": value },
        QueryOperator::In => doc! { "$in": value },
        QueryOperator::NotIn => doc! { "$exists": true, "$nin": value },
        QueryOperator::ArrayContains => doc! { "$elemMatch": { "$eq": value } },
        QueryOperator::ArrayContainsAny => doc! { "$elemMatch": { "$in": value } },
    };
    let mut clause = Document::new();
    clause.insert(constraint.path.clone(), condition);
    Ok(clause)
}

/// AND of all constraints, restricted to identifiers after `after`.
pub fn query_filter(constraints: &[QueryConstraint], after: Option<&str>) -> KeepResult<Document> {
    let mut clauses = constraints
        .iter()
        .map(constraint_filter)
        .collect::<KeepResult<Vec<Document>>>()?;
    if let Some(token) = after {
        clauses.push(doc! { "_id": { "$gt": token } });
    }
    Ok(match clauses.len() {
        0 => Document::new(),
        1 => clauses.remove(0),
        _ => doc! { "$and": clauses },
    })
}

/// Identifier-ascending sort every listing uses.
pub fn id_order() -> Document {
    doc! { "_id": 1 }
}
