use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use compound_explorer::data::aggregate::DateCount;
use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Captures-per-day chart
// ---------------------------------------------------------------------------

/// Draw a count-per-day chart.  Points are joined only between dates that
/// are present in the series; missing days are not drawn as zero.
///
/// When `by_make` is non-empty one coloured series per make replaces the
/// overall series.
pub fn count_plot(
    ui: &mut Ui,
    id: &str,
    title: &str,
    series: &[DateCount],
    by_make: &BTreeMap<String, Vec<DateCount>>,
    colors: &ColorMap,
) {
    ui.strong(title);
    if series.is_empty() {
        ui.weak("No dated items in the selected period.");
        return;
    }

    Plot::new(id)
        .legend(Legend::default())
        .height(260.0)
        .x_axis_label("Date")
        .y_axis_label("Count")
        .x_axis_formatter(|mark, _range| format_day(mark.value))
        .label_formatter(|name, value: &PlotPoint| {
            let prefix = if name.is_empty() {
                String::new()
            } else {
                format!("{name}\n")
            };
            format!("{prefix}{}: {:.0}", format_day(value.x), value.y)
        })
        .include_y(0.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if by_make.is_empty() {
                let color = Color32::LIGHT_BLUE;
                plot_ui.line(Line::new(points(series)).name("All").color(color).width(1.5));
                plot_ui.points(Points::new(points(series)).color(color).radius(3.0));
            } else {
                for (make, make_series) in by_make {
                    let color = colors.color_for(make);
                    plot_ui.line(Line::new(points(make_series)).name(make).color(color).width(1.5));
                    plot_ui.points(
                        Points::new(points(make_series))
                            .name(make)
                            .color(color)
                            .radius(3.0),
                    );
                }
            }
        });
}

fn points(series: &[DateCount]) -> PlotPoints {
    series
        .iter()
        .map(|dc| [day_number(dc.date), dc.count as f64])
        .collect()
}

/// Days since the common era, used as the x coordinate.
fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn format_day(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_numbers_round_trip_through_axis_labels() {
        let date = NaiveDate::from_ymd_opt(2011, 5, 2).unwrap();
        assert_eq!(format_day(day_number(date)), "2011-05-02");
        assert_eq!(format_day(day_number(date) + 0.4), "2011-05-02");
        assert_eq!(format_day(f64::MAX), "");
    }
}
