use pixans::color::{rgb_to_yuv, yuv_to_rgb};
use pixans::{decode_image, encode_image, EntropyRecord, PixelGrid, PredictorParams};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> pixans::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pixans=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let (w, h) = (256, 256);
    let mut data = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            data.push(((x * 3 + y) % 256) as u8);
            data.push(((x + y * 2) % 256) as u8);
            data.push(((x ^ y) % 256) as u8);
        }
    }
    let rgb = PixelGrid::new(w, h, 3, data)?;

    for params in [PredictorParams::med(), PredictorParams::least_squares()] {
        for _ in 0..20 {
            let encoded = encode_image(&rgb, &params)?;
            let record = EntropyRecord::from_bytes(&encoded.record.to_bytes()?)?;
            let decoded = decode_image::<u8>(&record, &params)?;
            assert_eq!(decoded.grid, rgb);

            let yuv = rgb_to_yuv(&rgb)?;
            let encoded = encode_image(&yuv, &params)?;
            let decoded = decode_image::<i16>(&encoded.record, &params)?;
            assert_eq!(yuv_to_rgb(&decoded.grid)?, rgb);
        }
    }
    Ok(())
}
