//! ECharts configuration for the dashboard, built with `charming`.
//!
//! The page gets one empty `div` per chart and a script that initialises
//! ECharts on each of them once the DOM has loaded.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, ItemStyle, JsFunction, Orient,
        Tooltip, Trigger,
    },
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::aggregation::{CategoryTotal, MonthlyTotals},
    html::HeadElement,
};

/// A chart and the ID of the element it is drawn in.
pub(super) struct DashboardChart {
    id: &'static str,
    options: String,
}

impl DashboardChart {
    pub(super) fn new(id: &'static str, chart: Chart) -> Self {
        Self {
            id,
            options: chart.to_string(),
        }
    }
}

pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section id="charts" class="w-full mx-auto mb-4" {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4" {
                @for chart in charts {
                    div id=(chart.id) class="min-h-[380px] rounded dark:bg-gray-100" {}
                }
            }
        }
    )
}

/// Initialise every chart, follow the system colour scheme and redraw on resize.
const INIT_CHART_JS: &str = r#"function initDashboardChart(id, option) {
    const chart = echarts.init(document.getElementById(id));
    chart.setOption(option);
    window.addEventListener('resize', chart.resize);

    const darkMode = window.matchMedia('(prefers-color-scheme: dark)');
    const applyTheme = () => chart.setTheme(darkMode.matches ? 'dark' : 'default');
    darkMode.addEventListener('change', applyTheme);
    applyTheme();
}"#;

pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let calls: String = charts
        .iter()
        .map(|chart| format!("    initDashboardChart(\"{}\", {});\n", chart.id, chart.options))
        .collect();

    HeadElement::ScriptSource(PreEscaped(format!(
        "{INIT_CHART_JS}\ndocument.addEventListener('DOMContentLoaded', () => {{\n{calls}}});"
    )))
}

/// Side-by-side income and expense bars per month.
pub(super) fn monthly_chart(series: &[MonthlyTotals]) -> Chart {
    let (labels, (income, expense)): (Vec<String>, (Vec<f64>, Vec<f64>)) = series
        .iter()
        .map(|totals| (totals.month.label(), (totals.income, totals.expense)))
        .unzip();

    Chart::new()
        .title(Title::new().text("Income and Expenses").subtext("By month"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(money_formatter())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .legend(Legend::new().right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(money_formatter())),
        )
        .series(
            Bar::new()
                .name("Income")
                .item_style(ItemStyle::new().color("green"))
                .data(income),
        )
        .series(
            Bar::new()
                .name("Expenses")
                .item_style(ItemStyle::new().color("red"))
                .data(expense),
        )
}

/// A donut of expenses split by category.
pub(super) fn category_chart(totals: &[CategoryTotal]) -> Chart {
    let slices: Vec<(f64, String)> = totals
        .iter()
        .map(|category| (category.total, category.name.clone()))
        .collect();

    Chart::new()
        .title(Title::new().text("Expenses by Category"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(money_formatter()),
        )
        .legend(Legend::new().orient(Orient::Vertical).left("left").top("15%"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .center(vec!["60%", "55%"])
                .data(slices),
        )
}

fn money_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "value",
        "return value ? new Intl.NumberFormat('en-US', { style: 'currency', currency: 'USD' }).format(value) : '-';",
    )
}

#[cfg(test)]
mod tests {
    use crate::{
        dashboard::aggregation::{CategoryTotal, MonthlyTotals},
        html::HeadElement,
        period::YearMonth,
    };

    use super::{DashboardChart, category_chart, charts_script, charts_view, monthly_chart};

    fn series() -> Vec<MonthlyTotals> {
        vec![
            MonthlyTotals {
                month: YearMonth::new(2025, 9).unwrap(),
                income: 3_000.0,
                expense: 1_250.5,
            },
            MonthlyTotals {
                month: YearMonth::new(2025, 10).unwrap(),
                income: 0.0,
                expense: 80.0,
            },
        ]
    }

    #[test]
    fn monthly_chart_has_label_per_month() {
        let options = monthly_chart(&series()).to_string();

        assert!(options.contains("2025-09"), "{options}");
        assert!(options.contains("2025-10"), "{options}");
        assert!(options.contains("1250.5"), "{options}");
    }

    #[test]
    fn category_chart_names_each_slice() {
        let totals = [CategoryTotal {
            name: "Groceries".to_owned(),
            total: 412.3,
        }];

        let options = category_chart(&totals).to_string();

        assert!(options.contains("Groceries"), "{options}");
        assert!(options.contains("412.3"), "{options}");
    }

    #[test]
    fn script_initialises_every_container() {
        let charts = [
            DashboardChart::new("monthly-chart", monthly_chart(&series())),
            DashboardChart::new("category-chart", category_chart(&[])),
        ];

        let container = charts_view(&charts).into_string();
        let HeadElement::ScriptSource(script) = charts_script(&charts) else {
            panic!("want inline script");
        };

        for id in ["monthly-chart", "category-chart"] {
            assert!(container.contains(&format!("id=\"{id}\"")));
            assert!(script.0.contains(&format!("initDashboardChart(\"{id}\"")));
        }
    }
}
