//! Common test fixtures for wxmaps tests.

/// Common time values for testing.
pub mod time {
    /// A fixed reference time for tests (2024-03-05T14:07:00Z)
    pub const REFERENCE_TIME: &str = "2024-03-05T14:07:00Z";

    /// The same instant as shown in map titles
    pub const REFERENCE_TITLE: &str = "03/05/2024 14:07Z";
}

/// THREDDS catalog documents.
pub mod catalog {
    /// Model catalog with a compound service and unordered datasets.
    pub const RAP_CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="http://www.unidata.ucar.edu/namespaces/thredds/InvCatalog/v1.0"
         xmlns:xlink="http://www.w3.org/1999/xlink" name="RAP 13km" version="1.0.6">
  <service name="fullServices" serviceType="Compound" base="">
    <service name="ncdods" serviceType="OPENDAP" base="/thredds/dodsC/"/>
    <service name="ncss" serviceType="NetcdfSubset" base="/thredds/ncss/grid/"/>
    <service name="HTTPServer" serviceType="HTTPServer" base="/thredds/fileServer/"/>
  </service>
  <dataset name="RAP 13km" ID="grib/NCEP/RAP/CONUS_13km">
    <metadata inherited="true">
      <serviceName>fullServices</serviceName>
    </metadata>
    <dataset name="RR_CONUS_13km_20240305_1200.grib2" ID="rap-1200"
             urlPath="grib/NCEP/RAP/CONUS_13km/RR_CONUS_13km_20240305_1200.grib2"/>
    <dataset name="RR_CONUS_13km_20240305_1400.grib2" ID="rap-1400"
             urlPath="grib/NCEP/RAP/CONUS_13km/RR_CONUS_13km_20240305_1400.grib2"/>
    <dataset name="RR_CONUS_13km_20240305_1300.grib2" ID="rap-1300"
             urlPath="grib/NCEP/RAP/CONUS_13km/RR_CONUS_13km_20240305_1300.grib2"/>
    <catalogRef xlink:href="latest.xml" xlink:title="Latest" name="latest"/>
  </dataset>
</catalog>
"#;

    /// Satellite file catalog with GOES start-time names.
    pub const GOES_CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="http://www.unidata.ucar.edu/namespaces/thredds/InvCatalog/v1.0" version="1.0.6">
  <service name="all" serviceType="Compound" base="">
    <service name="HTTPServer" serviceType="HTTPServer" base="/thredds/fileServer/"/>
    <service name="OPENDAP" serviceType="OPENDAP" base="/thredds/dodsC/"/>
  </service>
  <dataset name="CONUS Channel02" ID="goes-c02">
    <metadata inherited="true"><serviceName>all</serviceName></metadata>
    <dataset name="OR_ABI-L2-CMIPC-M6C02_G16_s20240651401170_e20240651403543_c20240651404023.nc"
             urlPath="satellite/goes/east/products/CloudAndMoisture/CONUS/Channel02/20240305/OR_ABI-L2-CMIPC-M6C02_G16_s20240651401170_e20240651403543_c20240651404023.nc"/>
    <dataset name="OR_ABI-L2-CMIPC-M6C02_G16_s20240651406170_e20240651408543_c20240651409018.nc"
             urlPath="satellite/goes/east/products/CloudAndMoisture/CONUS/Channel02/20240305/OR_ABI-L2-CMIPC-M6C02_G16_s20240651406170_e20240651408543_c20240651409018.nc"/>
  </dataset>
</catalog>
"#;
}
