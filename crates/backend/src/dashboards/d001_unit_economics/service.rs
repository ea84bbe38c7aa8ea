use anyhow::Result;
use chrono::{DateTime, Duration, Local, TimeZone, Timelike};
use contracts::dashboards::d001_unit_economics::{
    DynamicsPoint, EconomicsWindow, Period, UnitEconomicsResponse,
};
use contracts::domain::a001_uzum_order_item::aggregate::UzumOrderItem;
use contracts::shared::money::format_amount;

use crate::domain::a001_uzum_order_item::OrderStore;

/// Чистая прибыль позиции: выплата минус себестоимость (0, если не задана)
pub fn net_profit(order: &UzumOrderItem) -> i64 {
    order.payout() - order.purchase_price
}

/// Начало текущих локальных суток. Если полночь выпала на переход
/// на летнее время, отсчитываем прошедшее с 00:00 время назад от now.
fn start_of_today(now: DateTime<Local>) -> i64 {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|start| start.timestamp_millis())
        .unwrap_or_else(|| {
            let elapsed_ms = i64::from(now.time().num_seconds_from_midnight()) * 1000
                + i64::from(now.timestamp_subsec_millis());
            now.timestamp_millis() - elapsed_ms
        })
}

/// Границы окна в epoch ms, обе включительно; None - без ограничения
fn window_bounds(period: Period, now: DateTime<Local>) -> (Option<i64>, Option<i64>) {
    let now_ms = now.timestamp_millis();
    match period {
        Period::Today => (Some(start_of_today(now)), Some(now_ms)),
        Period::Week => (Some((now - Duration::days(7)).timestamp_millis()), Some(now_ms)),
        Period::Month => (Some((now - Duration::days(30)).timestamp_millis()), Some(now_ms)),
        Period::All => (None, None),
        Period::Custom { from, to } => (Some(from), Some(to)),
    }
}

/// Позиции, попадающие в окно; отмененные и возвраты исключаются всегда
fn in_window<'a>(
    orders: &'a [UzumOrderItem],
    period: Period,
    now: DateTime<Local>,
) -> impl Iterator<Item = &'a UzumOrderItem> {
    let (from, to) = window_bounds(period, now);
    orders.iter().filter(move |order| {
        !order.is_cancelled()
            && from.map_or(true, |from| order.date >= from)
            && to.map_or(true, |to| order.date <= to)
    })
}

pub fn aggregate_at(orders: &[UzumOrderItem], period: Period, now: DateTime<Local>) -> EconomicsWindow {
    in_window(orders, period, now).fold(EconomicsWindow::default(), |mut acc, order| {
        acc.revenue += order.total_price;
        acc.profit += net_profit(order);
        acc.commission += order.commission;
        acc.logistics += order.logistic_delivery_fee;
        acc.count += 1;
        acc
    })
}

pub fn aggregate(orders: &[UzumOrderItem], period: Period) -> EconomicsWindow {
    aggregate_at(orders, period, Local::now())
}

/// Ряд динамики в хронологическом порядке: по дням, для "сегодня" по часам
pub fn dynamics_at(orders: &[UzumOrderItem], period: Period, now: DateTime<Local>) -> Vec<DynamicsPoint> {
    let mut selected: Vec<&UzumOrderItem> = in_window(orders, period, now).collect();
    selected.sort_by_key(|order| order.date);

    let format = if period == Period::Today { "%H:00" } else { "%d.%m.%Y" };

    let mut points: Vec<DynamicsPoint> = Vec::new();
    for order in selected {
        let Some(label) = Local
            .timestamp_millis_opt(order.date)
            .single()
            .map(|dt| dt.format(format).to_string())
        else {
            tracing::warn!("Order {} has invalid date {}", order.id, order.date);
            continue;
        };

        match points.last_mut() {
            Some(last) if last.label == label => {
                last.sales += order.total_price;
                last.profit += net_profit(order);
            }
            _ => points.push(DynamicsPoint {
                label,
                sales: order.total_price,
                profit: net_profit(order),
            }),
        }
    }
    points
}

/// Данные дашборда юнит-экономики
pub async fn get_unit_economics(store: &dyn OrderStore, period: Period) -> Result<UnitEconomicsResponse> {
    let orders = store.get().await?;
    let now = Local::now();
    let totals = aggregate_at(&orders, period, now);

    tracing::info!(
        "Unit economics {:?}: {} orders, revenue {}, profit {}",
        period,
        totals.count,
        format_amount(totals.revenue),
        format_amount(totals.profit)
    );

    Ok(UnitEconomicsResponse {
        period,
        totals,
        dynamics: dynamics_at(&orders, period, now),
    })
}
