//! ECharts chart builders shared by the dashboard and the yearly report.
//!
//! Charts are emitted as JSON option objects embedded in a `<script>`
//! initialization block, with an empty container `div` per chart that the
//! script renders into client-side.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    datatype::DataPointItem,
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, ItemStyle, JsFunction, Tooltip, Trigger,
    },
    series::{Pie, bar::Bar},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::html::HeadElement;

/// The path the ECharts library is served from.
pub(crate) const ECHARTS_SCRIPT: &str = "/static/echarts.6.0.0.min.js";

/// The fallback colors assigned to pie slices, cycled by rank, when a
/// category has no stored color.
pub(crate) const PIE_PALETTE: [&str; 5] =
    ["#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6"];

/// An embedded chart with its HTML container ID and ECharts configuration.
pub(crate) struct EmbeddedChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// A pie chart slice for a category's spending.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PieSlice {
    pub name: String,
    pub value: Decimal,
    pub color: String,
}

/// Renders the HTML containers for embedded charts.
pub(crate) fn charts_view(charts: &[EmbeddedChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for embedded charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(crate) fn charts_script(charts: &[EmbeddedChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// The bar chart of monthly spending totals.
pub(crate) fn monthly_spending_chart(labels: Vec<String>, totals: &[Decimal]) -> Chart {
    let values = totals
        .iter()
        .map(|total| total.to_f64().unwrap_or_default())
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Monthly Spending")
                .subtext("Last twelve months"),
        )
        .tooltip(currency_tooltip())
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
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Spent").data(values))
}

/// A pie chart of spending per category, one slice per entry in `slices`.
pub(crate) fn category_pie_chart(title: &str, subtext: &str, slices: &[PieSlice]) -> Chart {
    let data = slices
        .iter()
        .map(|slice| {
            DataPointItem::new(slice.value.to_f64().unwrap_or_default())
                .name(slice.name.clone())
                .item_style(ItemStyle::new().color(slice.color.clone()))
        })
        .collect::<Vec<_>>();

    Chart::new()
        .title(Title::new().text(title).subtext(subtext))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().top("bottom"))
        .series(
            Pie::new()
                .name("Spent")
                .radius(vec!["40%", "65%"])
                .avoid_label_overlap(true)
                .data(data),
        )
}

// Mirrors the dinar format used server-side by format_currency.
#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const amountFormatter = new Intl.NumberFormat('en-US', {
              minimumFractionDigits: 3,
              maximumFractionDigits: 3,
            });
            return (number) ? 'KD ' + amountFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
