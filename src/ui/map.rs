//! Map panel: world basemap, report markers, polygon overlays and the
//! picking crosshair, rendered on a braille canvas.

use crate::app::{App, Focus};
use crate::theme::Category;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Map, MapResolution},
        Block, Borders,
    },
    Frame,
};

pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let (lat_half, lng_half) = app.map_span();
    let (center_lat, center_lng) = if app.picking_mode {
        app.crosshair
    } else {
        app.map_center
    };

    let title = if app.picking_mode {
        format!(
            " Map — picking {:.4}, {:.4} ",
            app.crosshair.0, app.crosshair.1
        )
    } else {
        format!(" Map — zoom {} ", app.map_zoom)
    };
    let border_style = if app.focus == Focus::Map {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let canvas = Canvas::default()
        .block(block)
        .x_bounds([center_lng - lng_half, center_lng + lng_half])
        .y_bounds([center_lat - lat_half, center_lat + lat_half])
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();

            // Polygon overlays: either the precise selection geometry or
            // the per-item projections. Rings are [lng, lat] pairs.
            for overlay in app.sync.overlays() {
                for ring in &overlay.rings {
                    for pair in ring.windows(2) {
                        ctx.draw(&CanvasLine {
                            x1: pair[0][0],
                            y1: pair[0][1],
                            x2: pair[1][0],
                            y2: pair[1][1],
                            color: Color::Yellow,
                        });
                    }
                }
            }
            ctx.layer();

            let selected_index = app
                .selected_id
                .as_deref()
                .and_then(|id| app.sync.index_of(id));
            for marker in app.sync.markers() {
                let item = &app.sync.items()[marker.item_index];
                let category = Category::parse(item.category.as_deref());
                let selected = selected_index == Some(marker.item_index);
                let style = if selected {
                    Style::default()
                        .fg(category.color())
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(category.color())
                };
                ctx.print(
                    marker.lng,
                    marker.lat,
                    Span::styled(category.glyph(), style),
                );
            }

            if app.picking_mode {
                ctx.layer();
                ctx.print(
                    app.crosshair.1,
                    app.crosshair.0,
                    Span::styled(
                        "✛",
                        Style::default()
                            .fg(Color::LightRed)
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            }
        });

    f.render_widget(canvas, area);
}
