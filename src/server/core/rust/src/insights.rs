/* src/server/core/rust/src/insights.rs */

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRollup {
  pub category: String,
  pub budget: i64,
  pub spent: i64,
  pub remaining: i64,
  /// Percentage of budget spent, one decimal; `None` when nothing was budgeted.
  pub percent_used: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
  pub categories: Vec<CategoryRollup>,
  pub total_budget: i64,
  pub total_spent: i64,
  pub total_remaining: i64,
  pub percent_used: Option<f64>,
}

fn amount(row: &Value) -> Option<i64> {
  match &row["amount"] {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn percent(spent: i64, budget: i64) -> Option<f64> {
  (budget != 0).then(|| (spent as f64 / budget as f64 * 1000.0).round() / 10.0)
}

/// Budget-versus-expense rollup per category. Amounts are integer cents;
/// rows without a category or a numeric amount are skipped.
pub fn transparency_rollup(budgets: &[Value], expenses: &[Value]) -> Rollup {
  let mut totals: BTreeMap<String, (i64, i64)> = BTreeMap::new();
  for (rows, is_budget) in [(budgets, true), (expenses, false)] {
    for row in rows {
      let (Some(category), Some(value)) = (row["category"].as_str(), amount(row)) else {
        continue;
      };
      let entry = totals.entry(category.to_string()).or_default();
      if is_budget {
        entry.0 += value;
      } else {
        entry.1 += value;
      }
    }
  }

  let categories: Vec<CategoryRollup> = totals
    .into_iter()
    .map(|(category, (budget, spent))| CategoryRollup {
      category,
      budget,
      spent,
      remaining: budget - spent,
      percent_used: percent(spent, budget),
    })
    .collect();
  let total_budget = categories.iter().map(|c| c.budget).sum();
  let total_spent = categories.iter().map(|c| c.spent).sum();
  Rollup {
    categories,
    total_budget,
    total_spent,
    total_remaining: total_budget - total_spent,
    percent_used: percent(total_spent, total_budget),
  }
}
