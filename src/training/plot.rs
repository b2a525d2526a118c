use crate::error::{Result, TrainError};
use crate::training::history::EpochHistory;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const PLOT_SIZE: (u32, u32) = (1200, 480);

fn plot_err<E: std::fmt::Display>(e: E) -> TrainError {
    TrainError::Plot(e.to_string())
}

fn points(values: &[f64]) -> impl Iterator<Item = (f64, f64)> + '_ {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| ((i + 1) as f64, v))
}

/// Render loss and accuracy curves side by side, training against validation.
pub fn plot_history(history: &EpochHistory, path: &Path) -> Result<()> {
    if history.is_empty() {
        return Err(TrainError::Plot("no completed epochs to plot".into()));
    }

    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let (left, right) = root.split_horizontally(PLOT_SIZE.0 / 2);

    let loss_max = history
        .loss
        .iter()
        .chain(&history.val_loss)
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);

    draw_panel(
        &left,
        "Loss",
        &history.loss,
        &history.val_loss,
        loss_max.max(1e-3) * 1.1,
    )?;
    draw_panel(
        &right,
        "Accuracy",
        &history.accuracy,
        &history.val_accuracy,
        1.0,
    )?;

    root.present().map_err(plot_err)?;
    log::info!("Training curves written to {}", path.display());
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    train: &[f64],
    val: &[f64],
    y_max: f64,
) -> Result<()> {
    let last_epoch = train.len().max(val.len()).max(2) as f64;

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(title, ("sans-serif", 20.0))
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(1f64..last_epoch, 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc(title)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(points(train), &BLUE))
        .map_err(plot_err)?
        .label("train")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    chart
        .draw_series(LineSeries::new(points(val), &RED))
        .map_err(plot_err)?
        .label("validation")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::history::EpochSummary;

    #[test]
    fn writes_png_for_completed_epochs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.png");

        let mut history = EpochHistory::new();
        for (epoch, loss) in [0.7, 0.5, 0.45].into_iter().enumerate() {
            history.push(&EpochSummary {
                epoch: epoch + 1,
                loss,
                accuracy: 0.6,
                val_loss: loss + 0.05,
                val_accuracy: 0.55,
            });
        }

        plot_history(&history, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn empty_history_is_not_plotted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.png");

        assert!(matches!(
            plot_history(&EpochHistory::new(), &path),
            Err(TrainError::Plot(_))
        ));
        assert!(!path.exists());
    }
}
