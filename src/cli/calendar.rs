//! Calendar CLI command

use clap::Args;

use crate::display::format_calendar_month;
use crate::error::BilleteraResult;
use crate::models::YearMonth;
use crate::services::CalendarService;
use crate::storage::Storage;

use super::{parse_period, today};

#[derive(Args)]
pub struct CalendarArgs {
    /// Month to show (YYYY-MM, defaults to the current one)
    #[arg(short, long)]
    pub month: Option<String>,
}

pub fn handle_calendar_command(storage: &Storage, args: CalendarArgs) -> BilleteraResult<()> {
    let period = match args.month {
        Some(m) => parse_period(&m)?,
        None => YearMonth::from_date(today()),
    };

    let month = CalendarService::new(storage).month(period.year, period.month, today())?;
    print!("{}", format_calendar_month(&month));

    Ok(())
}
