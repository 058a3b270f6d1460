#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::Async;
use log::info;
use static_cell::StaticCell;

use meter_shuttle_firmware::config;
use meter_shuttle_firmware::settings::LorawanSettings;
use meter_shuttle_firmware::shuttle::ShuttleSession;
use meter_shuttle_firmware::tasks::{report_task, ReportReceiver, REPORT_CHANNEL};

/// Provisioning paragraph baked into this image. On the full meter platform
/// the same paragraph comes out of the config file on the SD card.
const LORAWAN_SECTION: &str = "
METERTYPE = WATER_M3
DEVEUI = 0000000000000000
APPEUI = 0000000000000000
APPKEY = 00000000000000000000000000000000
";

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

type ShuttleBus = I2c<'static, Async>;
type FirmwareSession = ShuttleSession<ShuttleBus, embassy_time::Delay>;

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // The shuttle sits on the camera SCCB bus
    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(config::i2c::FREQUENCY_KHZ)),
    )
    .unwrap()
    .with_sda(peripherals.GPIO4)
    .with_scl(peripherals.GPIO5)
    .into_async();

    let mut settings = LorawanSettings::default();
    settings.apply_section(LORAWAN_SECTION);

    let mut session = ShuttleSession::new(i2c, embassy_time::Delay, settings);
    session.enable();

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(spawner, session));
    })
}

#[embassy_executor::task]
async fn async_main(spawner: Spawner, session: FirmwareSession) {
    info!("Meter shuttle firmware starting");

    let report_receiver = REPORT_CHANNEL.receiver();
    spawner.spawn(report_runner(session, report_receiver)).unwrap();
}

/// Task wrapper pinning the generic report task to the firmware types
#[embassy_executor::task]
async fn report_runner(session: FirmwareSession, receiver: ReportReceiver) {
    report_task(session, receiver).await;
}
