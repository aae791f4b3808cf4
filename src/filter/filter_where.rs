use serde_json::Value;

use super::error::FilterError;
use super::types::FilterOp;

/// Compiles a WHERE document into a parameterized SQL predicate.
///
/// Documents are JSON objects. Plain keys are column conditions, either
/// implicit equality (`{"mandal_name": "KUPPAM"}`) or an operator object
/// (`{"sec_code": {"$gte": 100}}`). Keys starting with `$` are the logical
/// connectives `$and`, `$or` and `$not`. Sibling keys are ANDed.
///
/// Every value lands in the parameter list; the generated SQL contains only
/// identifiers, operators and `$n` placeholders.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut builder = Self {
            param_values: vec![],
            param_index: starting_param_index,
        };
        let sql = builder.compile(where_data)?;
        Ok((sql, builder.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        if where_data.is_null() {
            return Ok(());
        }
        match where_data {
            Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause(
                "WHERE must be an object".to_string(),
            )),
        }
    }

    fn compile(&mut self, where_data: &Value) -> Result<String, FilterError> {
        match where_data {
            Value::Null => Ok(String::new()),
            Value::Object(obj) => {
                let mut parts = Vec::new();
                for (key, value) in obj {
                    if key.starts_with('$') {
                        parts.push(self.compile_logical(key, value)?);
                    } else {
                        parts.extend(self.compile_field(key, value)?);
                    }
                }
                Ok(parts.join(" AND "))
            }
            _ => Err(FilterError::InvalidWhereClause(
                "Unsupported WHERE format".to_string(),
            )),
        }
    }

    fn compile_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("{} requires an array", op))
                })?;
                if arr.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{} requires a non-empty array",
                        op
                    )));
                }
                let mut sub = Vec::with_capacity(arr.len());
                for clause in arr {
                    let sql = self.compile(clause)?;
                    sub.push(format!("({})", sql));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sub.join(joiner)))
            }
            "$not" => {
                let sql = self.compile(value)?;
                Ok(format!("NOT ({})", sql))
            }
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    fn compile_field(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        Self::validate_column(field)?;
        let mut out = Vec::new();
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = Self::map_operator(op_key)?;
                out.push(self.build_condition(field, operator, op_val)?);
            }
        } else {
            out.push(self.build_condition(field, FilterOp::Eq, value)?);
        }
        Ok(out)
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$between" => FilterOp::Between,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_condition(
        &mut self,
        column: &str,
        operator: FilterOp,
        data: &Value,
    ) -> Result<String, FilterError> {
        let quoted = format!("\"{}\"", column);
        match operator {
            FilterOp::Eq => {
                if data.is_null() {
                    Ok(format!("{} IS NULL", quoted))
                } else {
                    Ok(format!("{} = {}", quoted, self.param(data.clone())))
                }
            }
            FilterOp::Ne => {
                if data.is_null() {
                    Ok(format!("{} IS NOT NULL", quoted))
                } else {
                    Ok(format!("{} <> {}", quoted, self.param(data.clone())))
                }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted, self.param(data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted, self.param(data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted, self.param(data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted, self.param(data.clone()))),
            FilterOp::Like => Ok(format!("{} LIKE {}", quoted, self.param(data.clone()))),
            FilterOp::ILike => Ok(format!("{} ILIKE {}", quoted, self.param(data.clone()))),
            FilterOp::In => {
                if let Value::Array(values) = data {
                    // Empty IN set matches nothing; fail closed.
                    if values.is_empty() {
                        return Ok("1=0".to_string());
                    }
                    let params: Vec<String> =
                        values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("{} IN ({})", quoted, params.join(", ")))
                } else {
                    Ok(format!("{} = {}", quoted, self.param(data.clone())))
                }
            }
            FilterOp::Between => {
                if let Value::Array(values) = data {
                    if values.len() != 2 {
                        return Err(FilterError::InvalidOperatorData(
                            "$between requires exactly 2 values".to_string(),
                        ));
                    }
                    Ok(format!(
                        "{} BETWEEN {} AND {}",
                        quoted,
                        self.param(values[0].clone()),
                        self.param(values[1].clone())
                    ))
                } else {
                    Err(FilterError::InvalidOperatorData(
                        "$between requires an array with 2 values".to_string(),
                    ))
                }
            }
        }
    }

    fn validate_column(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(name.to_string()))
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality() {
        let (sql, params) = FilterWhere::generate(&json!({"mandal_name": "KUPPAM"}), 0).unwrap();
        assert_eq!(sql, "\"mandal_name\" = $1");
        assert_eq!(params, vec![json!("KUPPAM")]);
    }

    #[test]
    fn null_compiles_to_is_null() {
        let (sql, params) = FilterWhere::generate(&json!({"mobile_number": null}), 0).unwrap();
        assert_eq!(sql, "\"mobile_number\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn or_of_pairs_numbers_params_sequentially() {
        let where_doc = json!({"$or": [
            {"mandal_name": "PUNGANUR", "sec_name": "TERUVEEDHI-03"},
            {"mandal_name": "KUPPAM", "sec_name": "KUPPAM-1"},
        ]});
        let (sql, params) = FilterWhere::generate(&where_doc, 0).unwrap();
        assert_eq!(
            sql,
            "((\"mandal_name\" = $1 AND \"sec_name\" = $2) OR (\"mandal_name\" = $3 AND \"sec_name\" = $4))"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn nested_params_continue_from_outer_conditions() {
        let where_doc = json!({
            "district": "CHITTOOR",
            "$or": [{"mandal_name": "KUPPAM"}, {"mandal_name": "PALAMANER"}],
        });
        let (sql, params) = FilterWhere::generate(&where_doc, 0).unwrap();
        assert!(sql.contains("$1") && sql.contains("$2") && sql.contains("$3"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_list_fails_closed() {
        let (sql, params) =
            FilterWhere::generate(&json!({"mandal_name": {"$in": []}}), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_bad_column_names() {
        let result = FilterWhere::generate(&json!({"name; DROP TABLE residents": 1}), 0);
        assert!(matches!(result, Err(FilterError::InvalidColumn(_))));
    }

    #[test]
    fn rejects_non_object_where() {
        let result = FilterWhere::generate(&json!("mandal_name = 'KUPPAM'"), 0);
        assert!(matches!(result, Err(FilterError::InvalidWhereClause(_))));
    }
}
